//! Terminal input module (engine-facing).
//!
//! This module is intentionally independent of any UI framework. It maps
//! `crossterm` key and mouse events into [`InputCommand`]s and keeps the
//! keyboard cursor used to pick grid cells.

pub mod cursor;
pub mod map;

pub use tui_tilematch_types as types;

pub use cursor::BoardCursor;
pub use map::{handle_key_event, mouse_click, should_quit, InputCommand};
