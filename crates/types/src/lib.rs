//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, terminal rendering, AI protocol).
//!
//! # Board Geometry
//!
//! Tiles sit on a square grid of up to [`MAX_GRID_SIZE`] cells per side and are
//! stacked in up to [`MAX_LAYERS`] layers. A tile is addressed by a
//! [`GridPos`] `(x, y, layer)`, with `x` the column and `y` the row.
//!
//! # Round Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MAX_HOLD` | 7 | Holding Area capacity; an 8th held tile loses the round |
//! | `SCORE_PER_MATCH` | 10 | Points per resolved triple |
//! | `TIMER_LIMIT` | 180 | Round countdown in seconds |
//! | `MAX_GRID_SIZE` | 12 | Generation cap for the grid side |
//! | `MAX_LAYERS` | 3 | Stacking depth cap |
//! | `TICK_MS` | 16 | Host loop timestep (~60 FPS) |
//!
//! # Layout Constants
//!
//! Hit testing works in a `900 x 700` layout space with y growing upwards.
//! Tiles are [`TILE_SIZE`] wide and overlap their neighbours: columns advance
//! by [`TILE_STEP_X`], rows by [`TILE_STEP_Y`] and each layer shifts down by
//! [`LAYER_OFFSET`].
//!
//! # Examples
//!
//! ```
//! use tui_tilematch_types::{GameAction, GridPos, MAX_HOLD, TILES_PER_MATCH};
//!
//! let action = GameAction::from_str("advanceLevel").unwrap();
//! assert_eq!(action, GameAction::AdvanceLevel);
//! assert_eq!(action.as_str(), "advanceLevel");
//!
//! let below = GridPos::new(2, 3, 0);
//! let above = GridPos::new(2, 3, 1);
//! assert!(above.covers(&below));
//! assert!(!below.covers(&above));
//!
//! assert_eq!(MAX_HOLD, 7);
//! assert_eq!(TILES_PER_MATCH, 3);
//! ```

/// Holding Area capacity. Reaching `MAX_HOLD + 1` held tiles loses the round.
pub const MAX_HOLD: usize = 7;

/// Points awarded for each resolved match.
pub const SCORE_PER_MATCH: u32 = 10;

/// Round countdown in seconds.
pub const TIMER_LIMIT: u32 = 180;

/// Largest grid side the level generator produces.
pub const MAX_GRID_SIZE: u8 = 12;

/// Stacking depth cap.
pub const MAX_LAYERS: u8 = 3;

/// Tiles consumed by one match (and tiles per generated group).
pub const TILES_PER_MATCH: usize = 3;

/// Grid side at level 1.
pub const BASE_GRID_SIZE: u8 = 6;

/// Tile count at level 1.
pub const BASE_TILE_COUNT: u32 = 18;

/// Distinct identities offered at level 1 (grows by one every three levels).
pub const BASE_IDENTITY_CAP: u32 = 6;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Tile edge length in layout units.
pub const TILE_SIZE: i32 = 60;

/// Horizontal distance between neighbouring columns.
pub const TILE_STEP_X: i32 = TILE_SIZE - 15;

/// Vertical distance between neighbouring rows.
pub const TILE_STEP_Y: i32 = TILE_SIZE - 25;

/// Downward shift applied per layer.
pub const LAYER_OFFSET: i32 = 15;

/// Layout space width.
pub const VIEW_WIDTH: i32 = 900;

/// Layout space height.
pub const VIEW_HEIGHT: i32 = 700;

/// Upward bias of the grid origin (leaves room for the Holding Area).
pub const GRID_BIAS_Y: i32 = 70;

/// Asset identifier used when no tile images are available.
pub const MISSING_ASSET: &str = "assets/tiles/__missing.png";

/// Round-unique tile handle, assigned in placement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u16);

/// Index into the round's asset catalog. Opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(pub u16);

/// A point in layout space (y grows upwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Grid cell plus stacking layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: u8,
    pub y: u8,
    pub layer: u8,
}

impl GridPos {
    pub const fn new(x: u8, y: u8, layer: u8) -> Self {
        Self { x, y, layer }
    }

    /// True when `self` shares the cell of `other` and sits strictly above it.
    pub fn covers(&self, other: &GridPos) -> bool {
        self.x == other.x && self.y == other.y && self.layer > other.layer
    }

    pub fn same_cell(&self, other: &GridPos) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// A placed tile.
///
/// Immutable once placed: it moves between Board and Holding Area as a value
/// and is never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: TileId,
    /// Match identity; exactly three tiles per generated group share it.
    pub identity: u16,
    pub pos: GridPos,
    pub asset: AssetId,
    /// Lower-left corner in layout space.
    pub anchor: Point,
}

/// Round lifecycle. Pause is an orthogonal flag on `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundStatus {
    Playing,
    Won,
    Lost,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Playing => "playing",
            RoundStatus::Won => "won",
            RoundStatus::Lost => "lost",
        }
    }
}

/// Why a round was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossReason {
    /// A pick pushed the Holding Area past [`MAX_HOLD`].
    HoldOverflow,
    /// The round clock reached zero.
    TimeUp,
}

impl LossReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossReason::HoldOverflow => "hold_overflow",
            LossReason::TimeUp => "time_up",
        }
    }
}

/// Host requests that carry no payload.
///
/// Picks carry a target and go through `GameState::pick` / `pick_cell` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Return the most recently held tile to the board
    Undo,
    /// Regenerate the current level, zeroing the score
    Reset,
    /// Start the next level (only after a win)
    AdvanceLevel,
    /// Freeze the round clock
    Pause,
    /// Unfreeze the round clock
    Resume,
    /// Flip the pause flag
    TogglePause,
}

impl GameAction {
    pub const ALL: [GameAction; 6] = [
        GameAction::Undo,
        GameAction::Reset,
        GameAction::AdvanceLevel,
        GameAction::Pause,
        GameAction::Resume,
        GameAction::TogglePause,
    ];

    /// Parse action from string (for AI protocol)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_tilematch_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("undo"), Some(GameAction::Undo));
    /// assert_eq!(GameAction::from_str("togglePause"), Some(GameAction::TogglePause));
    /// assert_eq!(GameAction::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "undo" => Some(GameAction::Undo),
            "reset" => Some(GameAction::Reset),
            "advancelevel" => Some(GameAction::AdvanceLevel),
            "pause" => Some(GameAction::Pause),
            "resume" => Some(GameAction::Resume),
            "togglepause" => Some(GameAction::TogglePause),
            _ => None,
        }
    }

    /// Convert to camelCase string for AI protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Undo => "undo",
            GameAction::Reset => "reset",
            GameAction::AdvanceLevel => "advanceLevel",
            GameAction::Pause => "pause",
            GameAction::Resume => "resume",
            GameAction::TogglePause => "togglePause",
        }
    }
}

/// Tiles consumed by one resolved match, in Holding Area order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchEvent {
    pub identity: u16,
    pub tiles: [Tile; TILES_PER_MATCH],
    /// Round score after the match was awarded.
    pub score: u32,
}

/// Core-side events for audio/effects collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    LevelStarted { level: u32, tiles: u16 },
    Picked(Tile),
    Undone(Tile),
    Matched(MatchEvent),
    Won { level: u32, score: u32 },
    Lost { reason: LossReason },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_and_layout_constants() {
        assert_eq!(MAX_HOLD, 7);
        assert_eq!(SCORE_PER_MATCH, 10);
        assert_eq!(TIMER_LIMIT, 180);
        assert_eq!(MAX_GRID_SIZE, 12);
        assert_eq!(MAX_LAYERS, 3);
        assert_eq!(TILE_SIZE, 60);
        assert_eq!(TILE_STEP_X, 45);
        assert_eq!(TILE_STEP_Y, 35);
    }

    #[test]
    fn grid_pos_cover_requires_same_cell() {
        let a = GridPos::new(1, 1, 0);
        assert!(GridPos::new(1, 1, 2).covers(&a));
        assert!(!GridPos::new(1, 2, 2).covers(&a));
        assert!(!GridPos::new(1, 1, 0).covers(&a));
    }

    #[test]
    fn action_names_parse_case_insensitively() {
        for action in GameAction::ALL {
            assert_eq!(GameAction::from_str(action.as_str()), Some(action));
            assert_eq!(
                GameAction::from_str(&action.as_str().to_uppercase()),
                Some(action)
            );
        }
        assert_eq!(GameAction::from_str("hardDrop"), None);
    }
}
