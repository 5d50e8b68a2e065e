//! Key mapping from terminal events to input commands.

use crate::types::GameAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// What a key press asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// Move the board cursor by one cell.
    Move { dx: i8, dy: i8 },
    /// Pick the topmost tile under the cursor (or confirm an overlay).
    Pick,
    /// Move the cursor to a hinted tile.
    Hint,
    /// A payload-free game action.
    Game(GameAction),
}

/// Map keyboard input to input commands.
pub fn handle_key_event(key: KeyEvent) -> Option<InputCommand> {
    match key.code {
        // Cursor
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(InputCommand::Move { dx: -1, dy: 0 })
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(InputCommand::Move { dx: 1, dy: 0 })
        }
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') | KeyCode::Char('w') | KeyCode::Char('W') => {
            Some(InputCommand::Move { dx: 0, dy: -1 })
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(InputCommand::Move { dx: 0, dy: 1 })
        }

        // Picking
        KeyCode::Enter | KeyCode::Char(' ') => Some(InputCommand::Pick),
        KeyCode::Char('?') => Some(InputCommand::Hint),

        // Actions
        KeyCode::Backspace | KeyCode::Char('u') | KeyCode::Char('U') => {
            Some(InputCommand::Game(GameAction::Undo))
        }
        KeyCode::Char('r') | KeyCode::Char('R') => Some(InputCommand::Game(GameAction::Reset)),
        KeyCode::Char('n') | KeyCode::Char('N') => {
            Some(InputCommand::Game(GameAction::AdvanceLevel))
        }
        KeyCode::Char('p') | KeyCode::Char('P') => {
            Some(InputCommand::Game(GameAction::TogglePause))
        }

        _ => None,
    }
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Terminal cell `(column, row)` of a left click, if this is one.
pub fn mouse_click(event: MouseEvent) -> Option<(u16, u16)> {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some((event.column, event.row)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_cursor_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Left)),
            Some(InputCommand::Move { dx: -1, dy: 0 })
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('L'))),
            Some(InputCommand::Move { dx: 1, dy: 0 })
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('w'))),
            Some(InputCommand::Move { dx: 0, dy: -1 })
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('j'))),
            Some(InputCommand::Move { dx: 0, dy: 1 })
        );
    }

    #[test]
    fn test_pick_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Enter)),
            Some(InputCommand::Pick)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char(' '))),
            Some(InputCommand::Pick)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('?'))),
            Some(InputCommand::Hint)
        );
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Backspace)),
            Some(InputCommand::Game(GameAction::Undo))
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('u'))),
            Some(InputCommand::Game(GameAction::Undo))
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('R'))),
            Some(InputCommand::Game(GameAction::Reset))
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('n'))),
            Some(InputCommand::Game(GameAction::AdvanceLevel))
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('p'))),
            Some(InputCommand::Game(GameAction::TogglePause))
        );
        assert_eq!(handle_key_event(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('c'))));
    }

    #[test]
    fn test_left_click_only() {
        let click = |kind| MouseEvent {
            kind,
            column: 12,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            mouse_click(click(MouseEventKind::Down(MouseButton::Left))),
            Some((12, 4))
        );
        assert_eq!(mouse_click(click(MouseEventKind::Down(MouseButton::Right))), None);
        assert_eq!(mouse_click(click(MouseEventKind::Moved)), None);
    }
}
