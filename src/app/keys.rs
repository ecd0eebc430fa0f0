// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard bindings

use crate::constants::opacity;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Something the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TakePicture,
    AdjustOpacity(i16),
    ToggleOverlay,
    SelectPrevious,
    SelectNext,
    Rescan,
    OpenFolder,
    ToggleHelp,
    Quit,
}

/// Map a key press to an action
pub fn action_for(key: KeyEvent) -> Option<Action> {
    // Ctrl+C to quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Char(' ') | KeyCode::Char('p') => Action::TakePicture,
        KeyCode::Left => Action::AdjustOpacity(-opacity::FINE_STEP),
        KeyCode::Right => Action::AdjustOpacity(opacity::FINE_STEP),
        KeyCode::PageDown => Action::AdjustOpacity(-opacity::COARSE_STEP),
        KeyCode::PageUp => Action::AdjustOpacity(opacity::COARSE_STEP),
        KeyCode::Char('v') => Action::ToggleOverlay,
        KeyCode::Up => Action::SelectPrevious,
        KeyCode::Down => Action::SelectNext,
        KeyCode::Char('r') => Action::Rescan,
        KeyCode::Char('o') => Action::OpenFolder,
        KeyCode::Char('h') => Action::ToggleHelp,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_shutter_keys() {
        assert_eq!(action_for(press(KeyCode::Char(' '))), Some(Action::TakePicture));
        assert_eq!(action_for(press(KeyCode::Char('p'))), Some(Action::TakePicture));
    }

    #[test]
    fn test_opacity_keys() {
        assert_eq!(action_for(press(KeyCode::Right)), Some(Action::AdjustOpacity(1)));
        assert_eq!(action_for(press(KeyCode::PageDown)), Some(Action::AdjustOpacity(-10)));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for(key), Some(Action::Quit));
        assert_eq!(action_for(press(KeyCode::Char('c'))), None);
    }
}
