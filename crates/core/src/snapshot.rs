use arrayvec::ArrayVec;

use crate::clock::format_clock;
use crate::hold::HOLD_SLOTS;
use crate::types::{AssetId, GridPos, LossReason, MatchEvent, Point, RoundStatus, Tile, TileId};

/// A placed tile as seen by collaborators, with its derived freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileView {
    pub id: TileId,
    pub identity: u16,
    pub pos: GridPos,
    pub asset: AssetId,
    pub anchor: Point,
    pub free: bool,
}

impl TileView {
    pub fn new(tile: &Tile, free: bool) -> Self {
        Self {
            id: tile.id,
            identity: tile.identity,
            pos: tile.pos,
            asset: tile.asset,
            anchor: tile.anchor,
            free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub level: u32,
    pub score: u32,
    pub remaining_ms: u32,
    pub limit_ms: u32,
    pub status: RoundStatus,
    pub loss_reason: Option<LossReason>,
    pub paused: bool,
    pub round_id: u32,
    pub seed: u32,
    pub rows: u8,
    pub cols: u8,
    /// Placed tiles in board order.
    pub board: Vec<TileView>,
    /// Held tiles in Holding Area order.
    pub hold: ArrayVec<Tile, HOLD_SLOTS>,
    /// The match resolved by the step that produced this snapshot.
    pub matched: Option<MatchEvent>,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.level = 0;
        self.score = 0;
        self.remaining_ms = 0;
        self.limit_ms = 0;
        self.status = RoundStatus::Playing;
        self.loss_reason = None;
        self.paused = false;
        self.round_id = 0;
        self.seed = 0;
        self.rows = 0;
        self.cols = 0;
        self.board.clear();
        self.hold.clear();
        self.matched = None;
    }

    /// True when picks would be accepted under the default pause policy.
    pub fn playable(&self) -> bool {
        self.status == RoundStatus::Playing && !self.paused
    }

    pub fn clock_label(&self) -> arrayvec::ArrayString<12> {
        format_clock(self.remaining_ms)
    }

    pub fn free_count(&self) -> usize {
        self.board.iter().filter(|t| t.free).count()
    }

    /// Topmost tile on cell `(x, y)`.
    pub fn top_at(&self, x: u8, y: u8) -> Option<&TileView> {
        self.board
            .iter()
            .filter(|t| t.pos.x == x && t.pos.y == y)
            .max_by_key(|t| t.pos.layer)
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            level: 0,
            score: 0,
            remaining_ms: 0,
            limit_ms: 0,
            status: RoundStatus::Playing,
            loss_reason: None,
            paused: false,
            round_id: 0,
            seed: 0,
            rows: 0,
            cols: 0,
            board: Vec::new(),
            hold: ArrayVec::new(),
            matched: None,
        }
    }
}
