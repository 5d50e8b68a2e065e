//! Game configuration

use crate::solver::DEFAULT_NODE_BUDGET;
use crate::types::TIMER_LIMIT;

/// What pause does to player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PausePolicy {
    /// Pause blocks picks and undo as well as the clock and match resolution.
    #[default]
    FreezeAll,
    /// Pause only freezes the clock and match resolution.
    AllowInteraction,
}

/// Whether generated boards are checked for a winning pick order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPolicy {
    /// Accept whatever the generator produces.
    #[default]
    Unchecked,
    /// Regenerate until the solver proves the board clearable, keeping the
    /// last attempt when none is proven within `max_attempts`.
    Solvable { max_attempts: u32, node_budget: u32 },
}

impl GenerationPolicy {
    pub fn solvable(max_attempts: u32) -> Self {
        GenerationPolicy::Solvable {
            max_attempts,
            node_budget: DEFAULT_NODE_BUDGET,
        }
    }
}

/// Run-wide settings for a [`GameState`](crate::GameState).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub seed: u32,
    pub start_level: u32,
    pub timer_limit_ms: u32,
    pub pause_policy: PausePolicy,
    pub generation: GenerationPolicy,
    /// Opaque tile image identifiers; empty selects the synthetic fallback.
    pub assets: Vec<String>,
}

impl GameConfig {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            start_level: 1,
            timer_limit_ms: TIMER_LIMIT * 1000,
            pause_policy: PausePolicy::default(),
            generation: GenerationPolicy::default(),
            assets: Vec::new(),
        }
    }
}
