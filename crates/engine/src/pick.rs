use tui_tilematch_core::{GameState, PickResult};
use tui_tilematch_types::{Point, Tile, TileId};

/// What a host asks to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    /// Topmost tile of a grid cell.
    Cell { x: u8, y: u8 },
    /// Topmost free tile under a layout-space point.
    Point(Point),
    /// A specific placed tile.
    Tile(TileId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickError {
    NotPlayable,
    OutOfBounds,
    Miss,
}

impl PickError {
    pub fn code(self) -> &'static str {
        match self {
            PickError::NotPlayable => "not_playable",
            PickError::OutOfBounds | PickError::Miss => "invalid_pick",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PickError::NotPlayable => "round is not accepting picks",
            PickError::OutOfBounds => "cell is outside the grid",
            PickError::Miss => "no free tile at target",
        }
    }
}

/// Pick on behalf of a host, turning no-ops into typed errors.
///
/// A pick that overflows the Holding Area still succeeds here: the tile did
/// move, and the round is now lost.
pub fn apply_pick(state: &mut GameState, target: PickTarget) -> Result<Tile, PickError> {
    if !state.accepts_input() {
        return Err(PickError::NotPlayable);
    }

    let result = match target {
        PickTarget::Cell { x, y } => {
            if x >= state.board().cols() || y >= state.board().rows() {
                return Err(PickError::OutOfBounds);
            }
            state.pick_cell(x, y)
        }
        PickTarget::Point(p) => state.pick(p),
        PickTarget::Tile(id) => state.pick_tile(id),
    };

    match result {
        PickResult::Picked(tile) | PickResult::Overflow(tile) => Ok(tile),
        PickResult::Miss => Err(PickError::Miss),
        PickResult::Ignored => Err(PickError::NotPlayable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_tilematch_core::GameConfig;
    use tui_tilematch_types::{GridPos, RoundStatus};

    fn game() -> GameState {
        GameState::new(GameConfig {
            assets: (0..12).map(|i| format!("{}.png", i)).collect(),
            ..GameConfig::with_seed(31)
        })
    }

    #[test]
    fn test_pick_cell() {
        let mut state = game();
        let tile = apply_pick(&mut state, PickTarget::Cell { x: 4, y: 2 }).unwrap();
        assert_eq!(tile.pos, GridPos::new(4, 2, 0));
        assert_eq!(state.hold().len(), 1);
    }

    #[test]
    fn test_pick_out_of_bounds() {
        let mut state = game();
        let err = apply_pick(&mut state, PickTarget::Cell { x: 6, y: 0 }).unwrap_err();
        assert_eq!(err, PickError::OutOfBounds);
        assert_eq!(err.code(), "invalid_pick");
    }

    #[test]
    fn test_pick_point_and_miss() {
        let mut state = game();
        let center = state.layout().center(GridPos::new(1, 0, 0));
        let tile = apply_pick(&mut state, PickTarget::Point(center)).unwrap();
        assert_eq!(tile.pos, GridPos::new(1, 0, 0));

        let err = apply_pick(&mut state, PickTarget::Point(center)).unwrap_err();
        assert_eq!(err, PickError::Miss);
    }

    #[test]
    fn test_pick_when_not_playable() {
        let mut state = game();
        state.set_paused(true);
        let err = apply_pick(&mut state, PickTarget::Cell { x: 0, y: 0 }).unwrap_err();
        assert_eq!(err.code(), "not_playable");
        assert_eq!(state.status(), RoundStatus::Playing);
    }
}
