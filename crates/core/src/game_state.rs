//! Game state module - the round lifecycle
//!
//! `GameState` owns every round-scoped structure (board, Holding Area, Undo
//! Log, clock) and is their only mutator. Hosts push picks and actions between
//! ticks and call [`GameState::step`] once per tick.
//!
//! ```text
//!             pick overflow / time up
//!   Playing ──────────────────────────▶ Lost
//!      │  ▲                               │
//!      │  └──────────── reset ◀───────────┘
//!      │ board and hold empty
//!      ▼
//!     Won ──── advance_level ────▶ Playing (level + 1, score kept)
//! ```

use crate::board::Board;
use crate::clock::RoundClock;
use crate::config::{GameConfig, GenerationPolicy, PausePolicy};
use crate::hold::{HoldingArea, UndoLog};
use crate::layout::{tile_contains, Layout};
use crate::level::{generate, AssetCatalog};
use crate::matcher::resolve_matches;
use crate::rng::SimpleRng;
use crate::snapshot::{GameSnapshot, TileView};
use crate::solver::solve;
use crate::types::*;

/// Undrained events kept before the oldest are dropped.
pub const MAX_QUEUED_EVENTS: usize = 256;

/// Outcome of a pick request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickResult {
    /// The tile moved to the Holding Area.
    Picked(Tile),
    /// The tile moved and overflowed the Holding Area; the round is lost.
    Overflow(Tile),
    /// No free tile at the requested point or cell.
    Miss,
    /// The round does not accept picks right now.
    Ignored,
}

impl PickResult {
    pub fn tile(&self) -> Option<Tile> {
        match self {
            PickResult::Picked(t) | PickResult::Overflow(t) => Some(*t),
            PickResult::Miss | PickResult::Ignored => None,
        }
    }

    pub fn is_picked(&self) -> bool {
        self.tile().is_some()
    }
}

/// A freshly built board plus its geometry.
struct BuiltRound {
    layout: Layout,
    board: Board,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    catalog: AssetCatalog,
    rng: SimpleRng,
    layout: Layout,
    board: Board,
    hold: HoldingArea,
    undo: UndoLog,
    clock: RoundClock,
    level: u32,
    score: u32,
    status: RoundStatus,
    loss_reason: Option<LossReason>,
    /// Monotonic round id (increments on every new round).
    round_id: u32,
    /// Tiles placed when the round started.
    round_tiles: u16,
    /// Match resolved by the latest step.
    last_match: Option<MatchEvent>,
    events: Vec<CoreEvent>,
}

impl GameState {
    /// Create a game and start its first round.
    pub fn new(config: GameConfig) -> Self {
        let catalog = AssetCatalog::new(config.assets.iter().cloned());
        let level = config.start_level.max(1);

        let mut state = Self {
            rng: SimpleRng::new(config.seed),
            clock: RoundClock::new(config.timer_limit_ms),
            layout: Layout::for_grid(0, 0),
            board: Board::new(0, 0),
            hold: HoldingArea::new(),
            undo: UndoLog::new(),
            level,
            score: 0,
            status: RoundStatus::Playing,
            loss_reason: None,
            round_id: 0,
            round_tiles: 0,
            last_match: None,
            events: Vec::new(),
            catalog,
            config,
        };
        state.start_round();
        state
    }

    /// Default configuration with the given seed.
    pub fn with_seed(seed: u32) -> Self {
        Self::new(GameConfig::with_seed(seed))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn seed(&self) -> u32 {
        self.config.seed
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn loss_reason(&self) -> Option<LossReason> {
        self.loss_reason
    }

    pub fn paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn round_id(&self) -> u32 {
        self.round_id
    }

    pub fn round_tiles(&self) -> u16 {
        self.round_tiles
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn hold(&self) -> &HoldingArea {
        &self.hold
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn clock(&self) -> &RoundClock {
        &self.clock
    }

    pub fn remaining_ms(&self) -> u32 {
        self.clock.remaining_ms()
    }

    pub fn last_match(&self) -> Option<MatchEvent> {
        self.last_match
    }

    /// True when picks and undo are accepted.
    pub fn accepts_input(&self) -> bool {
        self.status == RoundStatus::Playing
            && !(self.clock.is_paused() && self.config.pause_policy == PausePolicy::FreezeAll)
    }

    /// Drain queued core events, oldest first.
    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: CoreEvent) {
        if self.events.len() >= MAX_QUEUED_EVENTS {
            let dropped = self.events.remove(0);
            log::trace!("event queue full, dropped {:?}", dropped);
        }
        self.events.push(event);
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.level = self.level;
        out.score = self.score;
        out.remaining_ms = self.clock.remaining_ms();
        out.limit_ms = self.clock.limit_ms();
        out.status = self.status;
        out.loss_reason = self.loss_reason;
        out.paused = self.clock.is_paused();
        out.round_id = self.round_id;
        out.seed = self.config.seed;
        out.rows = self.board.rows();
        out.cols = self.board.cols();

        out.board.clear();
        out.board.extend(
            self.board
                .tiles()
                .iter()
                .map(|t| TileView::new(t, self.board.is_free(t))),
        );
        out.hold.clear();
        out.hold.extend(self.hold.tiles().iter().copied());
        out.matched = self.last_match;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Pick the topmost free tile containing `point`.
    ///
    /// Candidates are searched by descending layer; among tiles of the same
    /// layer the earliest in board order wins.
    pub fn pick(&mut self, point: Point) -> PickResult {
        if !self.accepts_input() {
            return PickResult::Ignored;
        }

        let mut best: Option<(usize, u8)> = None;
        for (i, t) in self.board.tiles().iter().enumerate() {
            if !tile_contains(t.anchor, point) || !self.board.is_free(t) {
                continue;
            }
            if best.map_or(true, |(_, layer)| t.pos.layer > layer) {
                best = Some((i, t.pos.layer));
            }
        }

        match best {
            Some((index, _)) => self.take(index),
            None => PickResult::Miss,
        }
    }

    /// Pick the topmost tile of grid cell `(x, y)`.
    pub fn pick_cell(&mut self, x: u8, y: u8) -> PickResult {
        if !self.accepts_input() {
            return PickResult::Ignored;
        }
        match self.board.top_at(x, y) {
            Some((index, _)) => self.take(index),
            None => PickResult::Miss,
        }
    }

    /// Pick a specific tile, provided it is still placed and free.
    pub fn pick_tile(&mut self, id: TileId) -> PickResult {
        if !self.accepts_input() {
            return PickResult::Ignored;
        }
        match self.board.position(id) {
            Some(index) if self.board.is_free(&self.board.tiles()[index]) => self.take(index),
            _ => PickResult::Miss,
        }
    }

    fn take(&mut self, index: usize) -> PickResult {
        let Some(tile) = self.board.remove_at(index) else {
            return PickResult::Miss;
        };

        self.undo.push(tile.id, index);
        let held = self.hold.push(tile);
        self.emit(CoreEvent::Picked(tile));
        log::debug!(
            "picked tile {} (identity {}) from index {}, {} held",
            tile.id.0,
            tile.identity,
            index,
            held
        );

        if self.hold.is_overflowing() {
            self.lose(LossReason::HoldOverflow);
            return PickResult::Overflow(tile);
        }
        PickResult::Picked(tile)
    }

    /// Return the most recently held tile to its board index.
    pub fn undo(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }

        let (entry, held) = match (self.undo.last(), self.hold.last()) {
            (Some(entry), Some(held)) => (*entry, *held),
            (None, None) => return false,
            _ => {
                log::error!(
                    "undo log ({}) and holding area ({}) out of step",
                    self.undo.len(),
                    self.hold.len()
                );
                debug_assert!(false, "undo log and holding area out of step");
                return false;
            }
        };
        if entry.tile != held.id {
            log::error!(
                "undo entry for tile {} but tile {} is held last",
                entry.tile.0,
                held.id.0
            );
            debug_assert!(false, "undo entry does not match the last held tile");
            return false;
        }

        self.undo.pop();
        self.hold.pop();
        let index = self.board.insert_at(held, entry.index);
        self.emit(CoreEvent::Undone(held));
        log::debug!("undo: tile {} back at index {}", held.id.0, index);
        true
    }

    /// Regenerate the current level and zero the score.
    pub fn reset_round(&mut self) {
        log::info!("reset at level {} (score {} discarded)", self.level, self.score);
        self.score = 0;
        self.start_round();
    }

    /// Start the next level after a win; the score carries over.
    pub fn advance_level(&mut self) -> bool {
        if self.status != RoundStatus::Won {
            return false;
        }
        self.level = self.level.saturating_add(1);
        self.start_round();
        true
    }

    /// Freeze or unfreeze the round. Only a playing round can be paused.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        if self.status != RoundStatus::Playing || self.clock.is_paused() == paused {
            return false;
        }
        self.clock.set_paused(paused);
        log::debug!("{}", if paused { "paused" } else { "resumed" });
        true
    }

    /// Apply a payload-free action
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::Undo => self.undo(),
            GameAction::Reset => {
                self.reset_round();
                true
            }
            GameAction::AdvanceLevel => self.advance_level(),
            GameAction::Pause => self.set_paused(true),
            GameAction::Resume => self.set_paused(false),
            GameAction::TogglePause => {
                let paused = self.clock.is_paused();
                self.set_paused(!paused)
            }
        }
    }

    /// One simulation step: clock, timeout, one match, win check.
    pub fn step(&mut self, elapsed_ms: u32) -> GameSnapshot {
        self.advance(elapsed_ms);
        self.snapshot()
    }

    /// [`GameState::step`] writing into a reusable snapshot.
    pub fn step_into(&mut self, elapsed_ms: u32, out: &mut GameSnapshot) {
        self.advance(elapsed_ms);
        self.snapshot_into(out);
    }

    /// Advance the round without building a snapshot. Returns whether a
    /// match resolved.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        self.advance(elapsed_ms);
        self.last_match.is_some()
    }

    fn advance(&mut self, elapsed_ms: u32) {
        self.last_match = None;
        if self.status != RoundStatus::Playing || self.clock.is_paused() {
            return;
        }

        self.clock.advance(elapsed_ms);
        if self.clock.is_expired() {
            self.lose(LossReason::TimeUp);
            return;
        }

        self.resolve_match();

        if self.board.is_empty() && self.hold.is_empty() {
            self.status = RoundStatus::Won;
            self.emit(CoreEvent::Won {
                level: self.level,
                score: self.score,
            });
            log::info!("level {} won with score {}", self.level, self.score);
        }
    }

    fn resolve_match(&mut self) {
        let Some((identity, tiles)) = resolve_matches(&mut self.hold) else {
            return;
        };

        self.undo.forget(&tiles);
        if self.undo.len() != self.hold.len() {
            log::error!(
                "undo log ({}) and holding area ({}) diverged after a match",
                self.undo.len(),
                self.hold.len()
            );
            debug_assert!(false, "undo log and holding area diverged");
        }

        self.score = self.score.saturating_add(SCORE_PER_MATCH);
        let event = MatchEvent {
            identity,
            tiles,
            score: self.score,
        };
        self.last_match = Some(event);
        self.emit(CoreEvent::Matched(event));
        log::debug!("matched identity {}, score {}", identity, self.score);
    }

    fn lose(&mut self, reason: LossReason) {
        self.status = RoundStatus::Lost;
        self.loss_reason = Some(reason);
        self.emit(CoreEvent::Lost { reason });
        log::info!(
            "level {} lost ({}) with score {}",
            self.level,
            reason.as_str(),
            self.score
        );
    }

    /// Replace the round with a hand-built board at the current level.
    pub fn load_board(&mut self, board: Board) {
        let layout = Layout::for_grid(board.rows(), board.cols());
        self.install(BuiltRound { layout, board });
    }

    fn start_round(&mut self) {
        let built = self.build_checked();
        self.install(built);
    }

    fn install(&mut self, built: BuiltRound) {
        self.layout = built.layout;
        self.board = built.board;
        self.hold.clear();
        self.undo.clear();
        self.clock.reset();
        self.status = RoundStatus::Playing;
        self.loss_reason = None;
        self.last_match = None;
        self.round_id = self.round_id.wrapping_add(1);
        self.round_tiles = self.board.len() as u16;

        self.emit(CoreEvent::LevelStarted {
            level: self.level,
            tiles: self.round_tiles,
        });
        log::info!(
            "level {} started: {}x{} grid, {} tiles (round {})",
            self.level,
            self.board.cols(),
            self.board.rows(),
            self.round_tiles,
            self.round_id
        );
    }

    fn build(&mut self) -> BuiltRound {
        let generated = generate(self.level, &self.catalog, &mut self.rng);
        let layout = Layout::for_grid(generated.rows(), generated.cols());
        let board = Board::from_level(&generated, &layout);
        BuiltRound { layout, board }
    }

    fn build_checked(&mut self) -> BuiltRound {
        let (max_attempts, node_budget) = match self.config.generation {
            GenerationPolicy::Unchecked => return self.build(),
            GenerationPolicy::Solvable {
                max_attempts,
                node_budget,
            } => (max_attempts.max(1), node_budget),
        };

        let mut attempt = 1;
        loop {
            let built = self.build();
            let outcome = solve(&built.board, &[], node_budget);
            if outcome.is_solved() {
                log::debug!("level {} proven solvable on attempt {}", self.level, attempt);
                return built;
            }
            if attempt >= max_attempts {
                log::warn!(
                    "level {} not proven solvable after {} attempts ({}), keeping last board",
                    self.level,
                    attempt,
                    outcome.as_str()
                );
                return built;
            }
            log::debug!(
                "level {} attempt {} {}, regenerating",
                self.level,
                attempt,
                outcome.as_str()
            );
            attempt += 1;
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
