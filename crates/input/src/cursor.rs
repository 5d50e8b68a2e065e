//! Board cursor for keyboard play.

/// A cell selection clamped to the current grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardCursor {
    x: u8,
    y: u8,
    cols: u8,
    rows: u8,
}

impl BoardCursor {
    pub fn new(cols: u8, rows: u8) -> Self {
        Self {
            x: 0,
            y: 0,
            cols,
            rows,
        }
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn position(&self) -> (u8, u8) {
        (self.x, self.y)
    }

    /// Move by a delta, stopping at the grid edges.
    pub fn move_by(&mut self, dx: i8, dy: i8) {
        self.x = Self::clamp(self.x as i16 + dx as i16, self.cols);
        self.y = Self::clamp(self.y as i16 + dy as i16, self.rows);
    }

    pub fn set(&mut self, x: u8, y: u8) {
        self.x = Self::clamp(x as i16, self.cols);
        self.y = Self::clamp(y as i16, self.rows);
    }

    /// Adopt new grid dimensions (a new level), keeping the cursor inside.
    pub fn resize(&mut self, cols: u8, rows: u8) {
        self.cols = cols;
        self.rows = rows;
        self.set(self.x, self.y);
    }

    fn clamp(v: i16, len: u8) -> u8 {
        v.clamp(0, (len as i16 - 1).max(0)) as u8
    }
}
