//! TUI Tile Match (workspace facade crate).
//!
//! Re-exports the member crates as `tui_tilematch::{core, engine, input, term,
//! adapter, types}` and carries the host-side run configuration shared by the
//! binaries.

pub mod config;

pub use tui_tilematch_adapter as adapter;
pub use tui_tilematch_core as core;
pub use tui_tilematch_engine as engine;
pub use tui_tilematch_input as input;
pub use tui_tilematch_term as term;
pub use tui_tilematch_types as types;
