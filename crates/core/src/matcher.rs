//! Match engine - resolves one triple per invocation
//!
//! Identities are considered in order of first appearance in the Holding
//! Area, not sorted. At most one match resolves per call; callers invoke it
//! once per simulation step so further triples resolve on later steps.

use crate::hold::HoldingArea;
use crate::types::{Tile, TILES_PER_MATCH};

/// First identity, by Holding Area order, held at least three times.
pub fn find_match(tiles: &[Tile]) -> Option<u16> {
    tiles.iter().enumerate().find_map(|(i, t)| {
        let first_seen = !tiles[..i].iter().any(|p| p.identity == t.identity);
        let count = tiles[i..].iter().filter(|p| p.identity == t.identity).count();
        (first_seen && count >= TILES_PER_MATCH).then_some(t.identity)
    })
}

/// Resolve at most one match, removing its tiles from `hold`.
///
/// Returns the matched identity and the removed tiles in Holding Area order.
pub fn resolve_matches(hold: &mut HoldingArea) -> Option<(u16, [Tile; TILES_PER_MATCH])> {
    let identity = find_match(hold.tiles())?;
    let tiles = hold.take_triple(identity)?;
    Some((identity, tiles))
}
