//! Pick-order solver
//!
//! Depth-first search over "which tiles have left the board". Everything else
//! about a search node follows from that set: a tile is free when every tile
//! stacked above it is gone, and the Holding Area holds `count % 3` tiles of
//! each identity (the initially held tiles plus the removed ones).
//!
//! The model assumes the host resolves matches between picks, which is what a
//! one-pick-per-step host does. A pick is legal only while the Holding Area
//! has a free slot: the overflow check runs before matches resolve, so even a
//! pick that would complete a triple loses on a full area.
//!
//! Failed removal sets are memoised. A node budget bounds the search; running
//! out yields [`SolveOutcome::Inconclusive`] rather than a guess.

use std::collections::HashSet;

use crate::board::Board;
use crate::types::{Tile, TileId, MAX_HOLD, MAX_GRID_SIZE, MAX_LAYERS, TILES_PER_MATCH};

/// Default node budget, enough for every generated level in practice.
pub const DEFAULT_NODE_BUDGET: u32 = 200_000;

const WORDS: usize =
    (MAX_GRID_SIZE as usize * MAX_GRID_SIZE as usize * MAX_LAYERS as usize).div_ceil(64);

/// Bitset of removed tile indices.
type Removed = [u64; WORDS];

/// Result of a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A full pick order, first pick first.
    Solved(Vec<TileId>),
    /// No pick order clears the board.
    Unsolvable,
    /// The node budget ran out first.
    Inconclusive,
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }

    pub fn first_move(&self) -> Option<TileId> {
        match self {
            SolveOutcome::Solved(plan) => plan.first().copied(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveOutcome::Solved(_) => "solved",
            SolveOutcome::Unsolvable => "unsolvable",
            SolveOutcome::Inconclusive => "inconclusive",
        }
    }
}

/// Search for a pick order that clears `board` starting from `held`.
pub fn solve(board: &Board, held: &[Tile], node_budget: u32) -> SolveOutcome {
    let tiles = board.tiles();
    if tiles.len() > WORDS * 64 {
        log::warn!("solver skipped: {} tiles exceed the search capacity", tiles.len());
        return SolveOutcome::Inconclusive;
    }

    let mut search = Search::new(tiles, held, node_budget);
    let outcome = match search.run() {
        Some(true) => SolveOutcome::Solved(search.plan),
        Some(false) => SolveOutcome::Unsolvable,
        None => SolveOutcome::Inconclusive,
    };
    log::debug!(
        "solver: {} after {} nodes ({} tiles, {} held)",
        outcome.as_str(),
        search.nodes,
        tiles.len(),
        held.len()
    );
    outcome
}

struct Search<'a> {
    tiles: &'a [Tile],
    /// Indices of the tiles stacked above each tile.
    blockers: Vec<Vec<u16>>,
    /// Held tiles per identity, modulo a match.
    counts: Vec<u8>,
    hold_len: usize,
    removed: Removed,
    remaining: usize,
    failed: HashSet<Removed>,
    nodes: u32,
    budget: u32,
    plan: Vec<TileId>,
}

impl<'a> Search<'a> {
    fn new(tiles: &'a [Tile], held: &[Tile], budget: u32) -> Self {
        let blockers = tiles
            .iter()
            .map(|t| {
                tiles
                    .iter()
                    .enumerate()
                    .filter(|(_, o)| o.pos.covers(&t.pos))
                    .map(|(i, _)| i as u16)
                    .collect()
            })
            .collect();

        let identities = tiles
            .iter()
            .chain(held)
            .map(|t| t.identity as usize + 1)
            .max()
            .unwrap_or(0);
        let mut counts = vec![0u8; identities];
        for t in held {
            let c = &mut counts[t.identity as usize];
            *c = (*c + 1) % TILES_PER_MATCH as u8;
        }
        let hold_len = counts.iter().map(|&c| c as usize).sum();

        Self {
            tiles,
            blockers,
            counts,
            hold_len,
            removed: [0; WORDS],
            remaining: tiles.len(),
            failed: HashSet::new(),
            nodes: 0,
            budget,
            plan: Vec::with_capacity(tiles.len()),
        }
    }

    #[inline]
    fn is_removed(&self, i: usize) -> bool {
        self.removed[i / 64] & (1u64 << (i % 64)) != 0
    }

    fn is_free(&self, i: usize) -> bool {
        self.blockers[i]
            .iter()
            .all(|&b| self.is_removed(b as usize))
    }

    /// Free tiles, triple-completing picks first, then identities already
    /// held, then the rest, each group in board order.
    fn candidates(&self) -> Vec<usize> {
        let mut out: Vec<usize> = (0..self.tiles.len())
            .filter(|&i| !self.is_removed(i) && self.is_free(i))
            .collect();
        out.sort_by_key(|&i| match self.counts[self.tiles[i].identity as usize] {
            2 => 0u8,
            1 => 1,
            _ => 2,
        });
        out
    }

    fn apply(&mut self, i: usize) {
        self.removed[i / 64] |= 1u64 << (i % 64);
        self.remaining -= 1;
        let c = &mut self.counts[self.tiles[i].identity as usize];
        if *c == 2 {
            *c = 0;
            self.hold_len -= 2;
        } else {
            *c += 1;
            self.hold_len += 1;
        }
    }

    fn revert(&mut self, i: usize) {
        self.removed[i / 64] &= !(1u64 << (i % 64));
        self.remaining += 1;
        let c = &mut self.counts[self.tiles[i].identity as usize];
        if *c == 0 {
            *c = 2;
            self.hold_len += 2;
        } else {
            *c -= 1;
            self.hold_len -= 1;
        }
    }

    fn run(&mut self) -> Option<bool> {
        if self.remaining == 0 {
            return Some(self.hold_len == 0);
        }
        if self.nodes >= self.budget {
            return None;
        }
        self.nodes += 1;

        if self.hold_len >= MAX_HOLD || self.failed.contains(&self.removed) {
            return Some(false);
        }

        for i in self.candidates() {
            self.apply(i);
            self.plan.push(self.tiles[i].id);
            match self.run() {
                Some(true) => return Some(true),
                Some(false) => {}
                None => return None,
            }
            self.plan.pop();
            self.revert(i);
        }

        self.failed.insert(self.removed);
        Some(false)
    }
}
