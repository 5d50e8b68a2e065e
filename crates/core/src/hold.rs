//! Holding Area and Undo Log
//!
//! The Holding Area is a bounded, ordered staging row for picked tiles. It has
//! room for `MAX_HOLD + 1` tiles: the extra slot holds the pick that overflows
//! the area and loses the round, so the losing state can still be shown.
//!
//! The Undo Log records one `{tile, index}` entry per pick. Matched tiles take
//! their entries with them, so log entries and held tiles always pair up
//! one-to-one, in the same order.

use arrayvec::ArrayVec;

use crate::types::{Tile, TileId, MAX_HOLD, TILES_PER_MATCH};

/// Physical slots of the Holding Area (capacity plus the overflow slot).
pub const HOLD_SLOTS: usize = MAX_HOLD + 1;

/// Ordered tiles waiting for a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldingArea {
    tiles: ArrayVec<Tile, HOLD_SLOTS>,
}

impl HoldingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// True once the area holds more than `MAX_HOLD` tiles.
    pub fn is_overflowing(&self) -> bool {
        self.tiles.len() > MAX_HOLD
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn last(&self) -> Option<&Tile> {
        self.tiles.last()
    }

    /// Append a picked tile and return the new length.
    ///
    /// Pushing past the overflow slot means the round kept accepting picks
    /// after it was lost; that is logged and the tile is dropped.
    pub fn push(&mut self, tile: Tile) -> usize {
        if let Err(err) = self.tiles.try_push(tile) {
            log::error!("holding area full, dropping tile {:?}", err.element().id);
            debug_assert!(false, "holding area pushed past its overflow slot");
        }
        self.tiles.len()
    }

    pub fn pop(&mut self) -> Option<Tile> {
        self.tiles.pop()
    }

    /// Number of held tiles with `identity`.
    pub fn count(&self, identity: u16) -> usize {
        self.tiles.iter().filter(|t| t.identity == identity).count()
    }

    /// Remove the first three tiles of `identity`, keeping the order of the
    /// rest. Returns `None` (and leaves the area untouched) when fewer than
    /// three are held.
    pub fn take_triple(&mut self, identity: u16) -> Option<[Tile; TILES_PER_MATCH]> {
        if self.count(identity) < TILES_PER_MATCH {
            return None;
        }

        let mut taken: ArrayVec<Tile, TILES_PER_MATCH> = ArrayVec::new();
        self.tiles.retain(|t| {
            if t.identity == identity && !taken.is_full() {
                taken.push(*t);
                false
            } else {
                true
            }
        });
        taken.into_inner().ok()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

/// One reversible pick: which tile left the board and from which index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoEntry {
    pub tile: TileId,
    pub index: usize,
}

/// LIFO pick history for the current round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, tile: TileId, index: usize) {
        self.entries.push(UndoEntry { tile, index });
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn last(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    /// Drop the entries of tiles that left the Holding Area through a match.
    pub fn forget(&mut self, tiles: &[Tile]) {
        self.entries
            .retain(|e| !tiles.iter().any(|t| t.id == e.tile));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetId, GridPos, Point};

    fn tile(id: u16, identity: u16) -> Tile {
        Tile {
            id: TileId(id),
            identity,
            pos: GridPos::new(id as u8, 0, 0),
            asset: AssetId(identity),
            anchor: Point::default(),
        }
    }

    #[test]
    fn test_overflow_after_max_hold() {
        let mut hold = HoldingArea::new();
        for i in 0..MAX_HOLD as u16 {
            hold.push(tile(i, i));
            assert!(!hold.is_overflowing());
        }
        assert_eq!(hold.push(tile(99, 99)), MAX_HOLD + 1);
        assert!(hold.is_overflowing());
    }

    #[test]
    fn test_take_triple_keeps_remaining_order() {
        let mut hold = HoldingArea::new();
        for (id, identity) in [(0, 1), (1, 2), (2, 1), (3, 1), (4, 3), (5, 1)] {
            hold.push(tile(id, identity));
        }

        let taken = hold.take_triple(1).unwrap();
        assert_eq!(taken.map(|t| t.id.0), [0, 2, 3]);

        let rest: Vec<u16> = hold.tiles().iter().map(|t| t.id.0).collect();
        assert_eq!(rest, vec![1, 4, 5]);
    }

    #[test]
    fn test_take_triple_needs_three() {
        let mut hold = HoldingArea::new();
        hold.push(tile(0, 4));
        hold.push(tile(1, 4));
        assert!(hold.take_triple(4).is_none());
        assert_eq!(hold.len(), 2);
    }

    #[test]
    fn test_undo_log_forget_matched() {
        let mut log = UndoLog::new();
        log.push(TileId(0), 3);
        log.push(TileId(1), 0);
        log.push(TileId(2), 5);

        log.forget(&[tile(0, 1), tile(2, 1)]);
        assert_eq!(log.entries(), &[UndoEntry { tile: TileId(1), index: 0 }]);
    }
}
