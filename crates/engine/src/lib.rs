//! Host-facing helpers layered on the core.
//!
//! - [`pick`]: typed pick requests with protocol error codes
//! - [`assist`]: hints and auto-pick backed by the core solver

pub mod assist;
pub mod pick;

pub use assist::{apply_assist, hint, hint_with_budget, AssistError, Hint, HintSource};
pub use pick::{apply_pick, PickError, PickTarget};
