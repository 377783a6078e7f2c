//! Keyboard shortcuts handled while the overlay window has focus.
//!
//! These only ever see keys the global tap let through, so the trigger can
//! never also fire a local shortcut.

use crate::keys::Modifiers;
use crate::services::{Command, EditAction};

/// A key press inside the overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalKey {
    pub modifiers: Modifiers,
    /// The character ignoring modifiers, e.g. `c` for Option+C.
    pub character: char,
}

impl LocalKey {
    pub fn new(modifiers: Modifiers, character: char) -> Self {
        Self {
            modifiers,
            character,
        }
    }
}

/// What an in-window shortcut asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalShortcut {
    SwitchService,
    Hide,
    Quit,
    Command(Command),
    Edit(EditAction),
}

impl LocalShortcut {
    pub fn resolve(key: LocalKey) -> Option<Self> {
        let m = key.modifiers;
        let c = key.character.to_ascii_lowercase();

        if m == Modifiers::OPTION && c == 'c' {
            return Some(Self::SwitchService);
        }

        if !(m.command() || m.control()) || m.option() {
            return None;
        }

        let shortcut = match c {
            'a' => Self::Edit(EditAction::SelectAll),
            'c' => Self::Edit(EditAction::Copy),
            'x' => Self::Edit(EditAction::Cut),
            'v' => Self::Edit(EditAction::Paste),
            'h' => Self::Hide,
            'q' => Self::Quit,
            'n' => Self::Command(Command::NewChat),
            'g' => Self::Command(Command::GoHome),
            's' if m.control() && m.command() => Self::Command(Command::ToggleSidebar),
            ',' if m.command() && !m.control() => Self::Command(Command::OpenSettings),
            _ => return None,
        };
        Some(shortcut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(modifiers: Modifiers, c: char) -> Option<LocalShortcut> {
        LocalShortcut::resolve(LocalKey::new(modifiers, c))
    }

    #[test]
    fn test_option_c_switches_service() {
        assert_eq!(resolve(Modifiers::OPTION, 'c'), Some(LocalShortcut::SwitchService));
        assert_eq!(resolve(Modifiers::OPTION, 'C'), Some(LocalShortcut::SwitchService));
        assert_eq!(resolve(Modifiers::OPTION | Modifiers::SHIFT, 'c'), None);
    }

    #[test]
    fn test_command_or_control_shortcuts() {
        for m in [Modifiers::COMMAND, Modifiers::CONTROL] {
            assert_eq!(resolve(m, 'h'), Some(LocalShortcut::Hide));
            assert_eq!(resolve(m, 'q'), Some(LocalShortcut::Quit));
            assert_eq!(resolve(m, 'n'), Some(LocalShortcut::Command(Command::NewChat)));
            assert_eq!(resolve(m, 'v'), Some(LocalShortcut::Edit(EditAction::Paste)));
        }
    }

    #[test]
    fn test_sidebar_needs_control_and_command() {
        assert_eq!(resolve(Modifiers::COMMAND, 's'), None);
        assert_eq!(
            resolve(Modifiers::COMMAND | Modifiers::CONTROL, 's'),
            Some(LocalShortcut::Command(Command::ToggleSidebar))
        );
    }

    #[test]
    fn test_settings_is_command_comma_only() {
        assert_eq!(
            resolve(Modifiers::COMMAND, ','),
            Some(LocalShortcut::Command(Command::OpenSettings))
        );
        assert_eq!(resolve(Modifiers::CONTROL, ','), None);
        assert_eq!(resolve(Modifiers::COMMAND | Modifiers::CONTROL, ','), None);
    }

    #[test]
    fn test_option_blocks_command_shortcuts() {
        assert_eq!(resolve(Modifiers::COMMAND | Modifiers::OPTION, 'n'), None);
        assert_eq!(resolve(Modifiers::NONE, 'n'), None);
        assert_eq!(resolve(Modifiers::COMMAND, 'z'), None);
    }
}
