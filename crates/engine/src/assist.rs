//! Hints and auto-pick
//!
//! A hint is the first move of a solver plan from the current position. When
//! the solver cannot prove a plan (budget exhausted, or the position is already
//! lost in the long run) the hint falls back to a greedy choice: complete a
//! triple, else extend a held identity, else the first free tile.

use tui_tilematch_core::{solve, GameState, SolveOutcome, DEFAULT_NODE_BUDGET};
use tui_tilematch_types::{Tile, MAX_HOLD};

use crate::pick::{apply_pick, PickError, PickTarget};

/// Where a hint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintSource {
    /// First move of a proven clearing order.
    Solver,
    /// Greedy fallback.
    Heuristic,
}

impl HintSource {
    pub fn as_str(self) -> &'static str {
        match self {
            HintSource::Solver => "solver",
            HintSource::Heuristic => "heuristic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub tile: Tile,
    pub source: HintSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistError {
    NotPlayable,
    NoHint,
    Pick(PickError),
}

impl AssistError {
    pub fn code(self) -> &'static str {
        match self {
            AssistError::NotPlayable => "not_playable",
            AssistError::NoHint => "no_hint",
            AssistError::Pick(err) => err.code(),
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AssistError::NotPlayable => "round is not accepting picks",
            AssistError::NoHint => "no safe pick available",
            AssistError::Pick(err) => err.message(),
        }
    }
}

/// Suggest the next pick with the default solver budget.
pub fn hint(state: &GameState) -> Option<Hint> {
    hint_with_budget(state, DEFAULT_NODE_BUDGET)
}

pub fn hint_with_budget(state: &GameState, node_budget: u32) -> Option<Hint> {
    if !state.accepts_input() || state.hold().len() >= MAX_HOLD {
        return None;
    }

    let board = state.board();
    match solve(board, state.hold().tiles(), node_budget) {
        SolveOutcome::Solved(plan) => {
            let id = plan.first().copied()?;
            let index = board.position(id)?;
            return Some(Hint {
                tile: board.tiles()[index],
                source: HintSource::Solver,
            });
        }
        outcome => log::debug!("hint falling back to heuristic ({})", outcome.as_str()),
    }

    let held = state.hold();
    board
        .free_tiles()
        .min_by_key(|(index, t)| {
            let rank = match held.count(t.identity) % 3 {
                2 => 0u8,
                1 => 1,
                _ => 2,
            };
            (rank, *index)
        })
        .map(|(_, t)| Hint {
            tile: *t,
            source: HintSource::Heuristic,
        })
}

/// Pick the hinted tile.
pub fn apply_assist(state: &mut GameState) -> Result<Tile, AssistError> {
    if !state.accepts_input() {
        return Err(AssistError::NotPlayable);
    }
    let hint = hint(state).ok_or(AssistError::NoHint)?;
    let tile = apply_pick(state, PickTarget::Tile(hint.tile.id)).map_err(AssistError::Pick)?;
    log::debug!(
        "assist picked tile {} ({})",
        tile.id.0,
        hint.source.as_str()
    );
    Ok(tile)
}
