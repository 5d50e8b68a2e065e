//! Layout module - tile anchors and hit testing in layout space
//!
//! The grid is centered in a `VIEW_WIDTH x VIEW_HEIGHT` space with y growing
//! upwards. Neighbouring tiles overlap (the column/row steps are smaller than
//! the tile edge) and every layer shifts down by `LAYER_OFFSET`, so a point can
//! fall inside several tiles. Pick resolution decides between them.

use crate::types::{
    GridPos, Point, GRID_BIAS_Y, LAYER_OFFSET, TILE_SIZE, TILE_STEP_X, TILE_STEP_Y, VIEW_HEIGHT,
    VIEW_WIDTH,
};

/// Placement geometry for one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    rows: u8,
    cols: u8,
    origin: Point,
}

impl Layout {
    pub fn for_grid(rows: u8, cols: u8) -> Self {
        let grid_w = cols as i32 * TILE_STEP_X + (TILE_SIZE - TILE_STEP_X);
        let grid_h = rows as i32 * TILE_STEP_Y + (TILE_SIZE - TILE_STEP_Y);
        let origin = Point::new(
            (VIEW_WIDTH - grid_w).div_euclid(2),
            (VIEW_HEIGHT - grid_h).div_euclid(2) + GRID_BIAS_Y,
        );
        Self { rows, cols, origin }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Lower-left corner of the tile at `pos`.
    pub fn anchor(&self, pos: GridPos) -> Point {
        Point::new(
            self.origin.x + pos.x as i32 * TILE_STEP_X,
            self.origin.y + pos.y as i32 * TILE_STEP_Y - pos.layer as i32 * LAYER_OFFSET,
        )
    }

    /// Center of the top face at `pos`, handy for tapping a known tile.
    pub fn center(&self, pos: GridPos) -> Point {
        let a = self.anchor(pos);
        Point::new(a.x + TILE_SIZE / 2, a.y + TILE_SIZE / 2)
    }
}

/// Inclusive rectangle test against a tile anchored at `anchor`.
#[inline]
pub fn tile_contains(anchor: Point, p: Point) -> bool {
    anchor.x <= p.x && p.x <= anchor.x + TILE_SIZE && anchor.y <= p.y && p.y <= anchor.y + TILE_SIZE
}
