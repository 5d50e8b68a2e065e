//! Terminal "game renderer" module.
//!
//! A small, game-oriented rendering layer for playing in a terminal. It
//! avoids widget toolkits and renders into a plain framebuffer that is
//! diffed and flushed to a crossterm backend.
//!
//! Goals:
//! - Keep `core` deterministic and testable
//! - Render the board from snapshots only
//! - Control the cell aspect ratio (4x2 characters per grid cell)

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use tui_tilematch_core as core;
pub use tui_tilematch_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{
    identity_color, identity_glyph, AdapterStatusView, AnchorY, GameView, HostOverlay, Viewport,
};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
