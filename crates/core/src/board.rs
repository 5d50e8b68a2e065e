//! Board module - placed tiles and the occlusion rule
//!
//! The board keeps its tiles in an ordered `Vec`. Order carries no spatial
//! meaning; it only matters when undo puts a tile back where it came from.
//!
//! Freedom is derived, never cached per tile: a tile is free iff no other tile
//! at the same `(x, y)` sits on a strictly higher layer. To keep that check
//! O(1) the board mirrors membership into a flat per-cell bitmask (bit `n` set
//! = a tile occupies layer `n` of that cell), updated on every insert/remove.
//! Coordinates: (x, y) where x is the column and y the row, row-major storage.

use crate::layout::Layout;
use crate::level::GeneratedLevel;
use crate::types::{GridPos, Tile, TileId, MAX_LAYERS};

/// The set of currently placed tiles plus the per-cell occupancy mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: u8,
    cols: u8,
    tiles: Vec<Tile>,
    /// Occupied-layer bitmask per cell, row-major (y * cols + x)
    occupancy: Vec<u8>,
}

impl Board {
    /// Create a new empty board
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            rows,
            cols,
            tiles: Vec::new(),
            occupancy: vec![0; rows as usize * cols as usize],
        }
    }

    /// Place a generated multiset: layer by layer, row-major within a layer,
    /// until the tiles run out. Tile ids follow placement order.
    pub fn from_level(level: &GeneratedLevel, layout: &Layout) -> Self {
        let mut board = Self::new(level.rows(), level.cols());
        board.tiles.reserve(level.tiles.len());

        let mut specs = level.tiles.iter();
        'layers: for layer in 0..MAX_LAYERS {
            for y in 0..level.rows() {
                for x in 0..level.cols() {
                    let Some(spec) = specs.next() else {
                        break 'layers;
                    };
                    let pos = GridPos::new(x, y, layer);
                    let tile = Tile {
                        id: TileId(board.tiles.len() as u16),
                        identity: spec.identity,
                        pos,
                        asset: spec.asset,
                        anchor: layout.anchor(pos),
                    };
                    board.push(tile);
                }
            }
        }

        debug_assert!(specs.next().is_none(), "generated more tiles than the stack holds");
        board
    }

    #[inline(always)]
    fn cell_index(&self, x: u8, y: u8) -> Option<usize> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        Some(y as usize * self.cols as usize + x as usize)
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in collection order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Collection index of the tile with `id`.
    pub fn position(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.position(id).is_some()
    }

    /// True when nothing occupies a strictly higher layer of the tile's cell.
    pub fn is_free(&self, tile: &Tile) -> bool {
        self.is_free_at(tile.pos)
    }

    /// Occlusion test for an arbitrary position.
    pub fn is_free_at(&self, pos: GridPos) -> bool {
        match self.cell_index(pos.x, pos.y) {
            Some(idx) => u32::from(self.occupancy[idx])
                .checked_shr(u32::from(pos.layer) + 1)
                .unwrap_or(0)
                == 0,
            None => true,
        }
    }

    /// Number of tiles stacked on cell `(x, y)`.
    pub fn stack_height(&self, x: u8, y: u8) -> u8 {
        self.cell_index(x, y)
            .map(|idx| self.occupancy[idx].count_ones() as u8)
            .unwrap_or(0)
    }

    /// The topmost tile of cell `(x, y)` with its collection index.
    pub fn top_at(&self, x: u8, y: u8) -> Option<(usize, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.pos.x == x && t.pos.y == y)
            .max_by_key(|(_, t)| t.pos.layer)
    }

    /// Free tiles in collection order.
    pub fn free_tiles(&self) -> impl Iterator<Item = (usize, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(move |(_, t)| self.is_free(t))
    }

    /// Remove the tile with `id`, returning its former index and the tile.
    pub fn remove(&mut self, id: TileId) -> Option<(usize, Tile)> {
        let index = self.position(id)?;
        self.remove_at(index).map(|tile| (index, tile))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Tile> {
        if index >= self.tiles.len() {
            return None;
        }
        let tile = self.tiles.remove(index);
        if let Some(cell) = self.cell_index(tile.pos.x, tile.pos.y) {
            self.occupancy[cell] &= !layer_bit(tile.pos.layer);
        }
        Some(tile)
    }

    /// Reinsert a tile at `index`; indices past the end append.
    ///
    /// Placing a tile on an occupied `(x, y, layer)` is a generation/ownership
    /// bug: it is logged and trips a debug assertion. So is a layer at or
    /// above `MAX_LAYERS`; such a tile is kept but never occludes anything.
    pub fn insert_at(&mut self, tile: Tile, index: usize) -> usize {
        let bit = layer_bit(tile.pos.layer);
        match self.cell_index(tile.pos.x, tile.pos.y) {
            Some(_) if bit == 0 => {
                log::error!(
                    "tile {:?} placed on layer {} (max {})",
                    tile.id,
                    tile.pos.layer,
                    MAX_LAYERS
                );
                debug_assert!(false, "tile layer out of range at {:?}", tile.pos);
            }
            Some(cell) => {
                if self.occupancy[cell] & bit != 0 {
                    log::error!(
                        "tile {:?} inserted on occupied cell ({}, {}) layer {}",
                        tile.id,
                        tile.pos.x,
                        tile.pos.y,
                        tile.pos.layer
                    );
                    debug_assert!(false, "duplicate tile at {:?}", tile.pos);
                }
                self.occupancy[cell] |= bit;
            }
            None => {
                log::error!("tile {:?} placed outside the {}x{} grid", tile.id, self.cols, self.rows);
                debug_assert!(false, "tile outside grid at {:?}", tile.pos);
            }
        }

        let index = index.min(self.tiles.len());
        self.tiles.insert(index, tile);
        index
    }

    /// Append a tile.
    pub fn push(&mut self, tile: Tile) -> usize {
        self.insert_at(tile, usize::MAX)
    }

    /// Remove every tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.occupancy.fill(0);
    }
}

/// Occupancy bit for `layer`, or 0 when the layer does not fit the stack.
fn layer_bit(layer: u8) -> u8 {
    if layer < MAX_LAYERS {
        1 << layer
    } else {
        0
    }
}
