//! Core puzzle engine - pure, deterministic, and testable
//!
//! This crate contains every rule of the layered tile-matching game. It has
//! **no dependencies** on terminals, networking, or I/O:
//!
//! - **Deterministic**: the same seed produces the same boards (replays, AI runs)
//! - **Host-driven**: time only moves through [`GameState::step`]
//! - **Renderer-agnostic**: collaborators read a [`GameSnapshot`] and drain
//!   [`CoreEvent`](types::CoreEvent)s, never the live structures
//!
//! # Module Structure
//!
//! - [`rng`]: seedable LCG for asset sampling and shuffling
//! - [`level`]: grid size, tile count and the shuffled identity multiset
//! - [`layout`]: tile anchors and hit testing in the `900 x 700` layout space
//! - [`board`]: placed tiles and the occlusion rule
//! - [`hold`]: the bounded Holding Area and the Undo Log
//! - [`matcher`]: one-triple-per-step match resolution
//! - [`clock`]: pausable round countdown
//! - [`solver`]: pick-order search used for hints and solvable generation
//! - [`game_state`]: the round lifecycle tying it all together
//!
//! # Rules
//!
//! - A tile is **free** when nothing sits on a higher layer of its cell
//! - Picking a free tile moves it to the Holding Area (capacity 7)
//! - Three held tiles of one identity are consumed for 10 points
//! - An 8th held tile or an expired clock loses the round
//! - Clearing board and Holding Area wins it
//!
//! # Example
//!
//! ```
//! use tui_tilematch_core::{GameConfig, GameState, PickResult};
//! use tui_tilematch_types::{RoundStatus, TICK_MS};
//!
//! let mut game = GameState::new(GameConfig::with_seed(12345));
//! assert_eq!(game.board().len(), 18);
//!
//! // Level 1 is a single layer, so every cell top is free.
//! let result = game.pick_cell(0, 0);
//! assert!(matches!(result, PickResult::Picked(_)));
//! assert!(game.undo());
//!
//! let snapshot = game.step(TICK_MS);
//! assert_eq!(snapshot.status, RoundStatus::Playing);
//! assert_eq!(snapshot.clock_label().as_str(), "03:00");
//! ```

pub mod board;
pub mod clock;
pub mod config;
pub mod game_state;
pub mod hold;
pub mod layout;
pub mod level;
pub mod matcher;
pub mod rng;
pub mod snapshot;
pub mod solver;

pub use tui_tilematch_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use clock::{format_clock, RoundClock};
pub use config::{GameConfig, GenerationPolicy, PausePolicy};
pub use game_state::{GameState, PickResult, MAX_QUEUED_EVENTS};
pub use hold::{HoldingArea, UndoEntry, UndoLog, HOLD_SLOTS};
pub use layout::{tile_contains, Layout};
pub use level::{generate, grid_size, level_params, AssetCatalog, GeneratedLevel, LevelParams};
pub use matcher::resolve_matches;
pub use rng::SimpleRng;
pub use snapshot::{GameSnapshot, TileView};
pub use solver::{solve, SolveOutcome, DEFAULT_NODE_BUDGET};
