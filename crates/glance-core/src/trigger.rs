//! The key combination that toggles the overlay.

use std::fmt;

use crate::keys::{self, Modifiers, keycode};

/// A modifier set plus a virtual keycode in `0..=255`.
///
/// Triggers are plain values: the monitor swaps them wholesale and never
/// edits one in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trigger {
    modifiers: Modifiers,
    key_code: u8,
}

impl Trigger {
    /// Option+Space.
    pub const DEFAULT: Trigger = Trigger {
        modifiers: Modifiers::OPTION,
        key_code: keycode::SPACE as u8,
    };

    /// Builds a trigger, rejecting keycodes outside `0..=255`.
    pub fn new(modifiers: Modifiers, key_code: u16) -> Option<Self> {
        let key_code = u8::try_from(key_code).ok()?;
        Some(Self {
            modifiers,
            key_code,
        })
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key_code(&self) -> u16 {
        u16::from(self.key_code)
    }

    /// True when the key itself is a modifier key, e.g. a bare Shift tap.
    pub fn is_modifier_only(&self) -> bool {
        keys::modifier_for_keycode(self.key_code()).is_some()
    }

    pub fn matches(&self, modifiers: Modifiers, key_code: u16) -> bool {
        self.modifiers == modifiers && self.key_code() == key_code
    }

    /// Packs into 12 bits: modifiers above the keycode byte.
    pub(crate) fn pack(self) -> u32 {
        (u32::from(self.modifiers.bits()) << 8) | u32::from(self.key_code)
    }

    pub(crate) fn unpack(word: u32) -> Self {
        Self {
            modifiers: Modifiers::from_bits_truncate((word >> 8) as u8),
            key_code: word as u8,
        }
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(m) = keys::modifier_for_keycode(self.key_code()) {
            // The key's own modifier is already part of the glyph string.
            return write!(f, "{}", self.modifiers | m);
        }
        write!(f, "{}{}", self.modifiers, keys::key_name(self.key_code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_option_space() {
        let t = Trigger::default();
        assert_eq!(t.modifiers(), Modifiers::OPTION);
        assert_eq!(t.key_code(), 49);
        assert_eq!(t.to_string(), "⌥Space");
    }

    #[test]
    fn test_rejects_out_of_range_keycode() {
        assert!(Trigger::new(Modifiers::NONE, 255).is_some());
        assert!(Trigger::new(Modifiers::NONE, 256).is_none());
    }

    #[test]
    fn test_pack_unpack() {
        let t = Trigger::new(Modifiers::SHIFT | Modifiers::COMMAND, 0x7E).unwrap();
        assert_eq!(Trigger::unpack(t.pack()), t);
        assert_eq!(Trigger::unpack(Trigger::DEFAULT.pack()), Trigger::DEFAULT);
    }

    #[test]
    fn test_modifier_only_display() {
        let t = Trigger::new(Modifiers::SHIFT, keycode::SHIFT).unwrap();
        assert!(t.is_modifier_only());
        assert_eq!(t.to_string(), "⇧");

        let t = Trigger::new(Modifiers::CONTROL | Modifiers::COMMAND, keycode::COMMAND).unwrap();
        assert_eq!(t.to_string(), "⌃⌘");
    }
}
