//! Modifier sets and macOS virtual keycodes.
//!
//! Keycodes follow the ANSI layout values from `HIToolbox/Events.h`. Modifier
//! flags follow `CGEventFlags`; everything outside the four recognized
//! modifiers (caps lock, fn, numeric pad, device dependent bits) is dropped.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Raw `CGEventFlags` bits for the recognized modifiers.
pub mod flags {
    /// kCGEventFlagMaskShift
    pub const SHIFT: u64 = 0x0002_0000;
    /// kCGEventFlagMaskControl
    pub const CONTROL: u64 = 0x0004_0000;
    /// kCGEventFlagMaskAlternate
    pub const OPTION: u64 = 0x0008_0000;
    /// kCGEventFlagMaskCommand
    pub const COMMAND: u64 = 0x0010_0000;

    /// Union of the four recognized modifier flags.
    pub const RECOGNIZED: u64 = SHIFT | CONTROL | OPTION | COMMAND;
}

/// A set of the four recognized modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1);
    pub const CONTROL: Self = Self(1 << 1);
    pub const OPTION: Self = Self(1 << 2);
    pub const COMMAND: Self = Self(1 << 3);

    const ALL_BITS: u8 = 0b1111;

    /// Table pairing each modifier with its `CGEventFlags` bit and display glyph.
    const TABLE: [(Modifiers, u64, &'static str); 4] = [
        (Modifiers::SHIFT, flags::SHIFT, "⇧"),
        (Modifiers::CONTROL, flags::CONTROL, "⌃"),
        (Modifiers::OPTION, flags::OPTION, "⌥"),
        (Modifiers::COMMAND, flags::COMMAND, "⌘"),
    ];

    /// Masks a raw event flags word down to the recognized modifiers.
    pub fn from_event_flags(raw: u64) -> Self {
        Self::TABLE
            .iter()
            .filter(|(_, bit, _)| raw & bit != 0)
            .fold(Self::NONE, |acc, (m, _, _)| acc | *m)
    }

    /// Strict conversion used for persisted masks: any bit outside the four
    /// recognized modifier flags is rejected.
    pub fn from_mask(raw: u64) -> Option<Self> {
        if raw & !flags::RECOGNIZED != 0 {
            return None;
        }
        Some(Self::from_event_flags(raw))
    }

    /// The `CGEventFlags` word for this set.
    pub fn to_mask(self) -> u64 {
        Self::TABLE
            .iter()
            .filter(|(m, _, _)| self.contains(*m))
            .fold(0, |acc, (_, bit, _)| acc | bit)
    }

    pub(crate) fn bits(self) -> u8 {
        self.0
    }

    pub(crate) fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    pub fn control(self) -> bool {
        self.contains(Self::CONTROL)
    }

    pub fn option(self) -> bool {
        self.contains(Self::OPTION)
    }

    pub fn command(self) -> bool {
        self.contains(Self::COMMAND)
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (m, _, glyph) in Self::TABLE {
            if self.contains(m) {
                f.write_str(glyph)?;
            }
        }
        Ok(())
    }
}

/// Named virtual keycodes.
pub mod keycode {
    pub const A: u16 = 0x00;
    pub const S: u16 = 0x01;
    pub const C: u16 = 0x08;
    pub const H: u16 = 0x04;
    pub const N: u16 = 0x2D;
    pub const RETURN: u16 = 0x24;
    pub const TAB: u16 = 0x30;
    pub const SPACE: u16 = 0x31;
    pub const ESCAPE: u16 = 0x35;

    pub const RIGHT_COMMAND: u16 = 0x36;
    pub const COMMAND: u16 = 0x37;
    pub const SHIFT: u16 = 0x38;
    pub const CAPS_LOCK: u16 = 0x39;
    pub const OPTION: u16 = 0x3A;
    pub const CONTROL: u16 = 0x3B;
    pub const RIGHT_SHIFT: u16 = 0x3C;
    pub const RIGHT_OPTION: u16 = 0x3D;
    pub const RIGHT_CONTROL: u16 = 0x3E;
}

/// The modifier a modifier key toggles, or `None` for every other key.
/// Caps lock is deliberately absent: it is not a recognized modifier.
pub fn modifier_for_keycode(code: u16) -> Option<Modifiers> {
    match code {
        keycode::SHIFT | keycode::RIGHT_SHIFT => Some(Modifiers::SHIFT),
        keycode::CONTROL | keycode::RIGHT_CONTROL => Some(Modifiers::CONTROL),
        keycode::OPTION | keycode::RIGHT_OPTION => Some(Modifiers::OPTION),
        keycode::COMMAND | keycode::RIGHT_COMMAND => Some(Modifiers::COMMAND),
        _ => None,
    }
}

/// Human readable name of a keycode, falling back to `key 0x..`.
pub fn key_name(code: u16) -> String {
    let name = match code {
        0x00 => "A",
        0x01 => "S",
        0x02 => "D",
        0x03 => "F",
        0x04 => "H",
        0x05 => "G",
        0x06 => "Z",
        0x07 => "X",
        0x08 => "C",
        0x09 => "V",
        0x0B => "B",
        0x0C => "Q",
        0x0D => "W",
        0x0E => "E",
        0x0F => "R",
        0x10 => "Y",
        0x11 => "T",
        0x12 => "1",
        0x13 => "2",
        0x14 => "3",
        0x15 => "4",
        0x16 => "6",
        0x17 => "5",
        0x18 => "=",
        0x19 => "9",
        0x1A => "7",
        0x1B => "-",
        0x1C => "8",
        0x1D => "0",
        0x1E => "]",
        0x1F => "O",
        0x20 => "U",
        0x21 => "[",
        0x22 => "I",
        0x23 => "P",
        0x25 => "L",
        0x26 => "J",
        0x27 => "'",
        0x28 => "K",
        0x29 => ";",
        0x2A => "\\",
        0x2B => ",",
        0x2C => "/",
        0x2D => "N",
        0x2E => "M",
        0x2F => ".",
        0x32 => "`",
        keycode::RETURN => "Return",
        keycode::TAB => "Tab",
        keycode::SPACE => "Space",
        0x33 => "Delete",
        keycode::ESCAPE => "Escape",
        0x7A => "F1",
        0x78 => "F2",
        0x63 => "F3",
        0x76 => "F4",
        0x60 => "F5",
        0x61 => "F6",
        0x62 => "F7",
        0x64 => "F8",
        0x65 => "F9",
        0x6D => "F10",
        0x67 => "F11",
        0x6F => "F12",
        0x7B => "Left",
        0x7C => "Right",
        0x7D => "Down",
        0x7E => "Up",
        _ => match modifier_for_keycode(code) {
            Some(m) => return m.to_string(),
            None => return format!("key 0x{code:02X}"),
        },
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_flags_ignore_caps_lock_and_device_bits() {
        // caps lock (0x10000) plus a left-option device bit (0x20)
        let raw = flags::OPTION | 0x0001_0000 | 0x20;
        assert_eq!(Modifiers::from_event_flags(raw), Modifiers::OPTION);
    }

    #[test]
    fn test_strict_mask_rejects_unknown_bits() {
        assert_eq!(
            Modifiers::from_mask(flags::SHIFT | flags::CONTROL),
            Some(Modifiers::SHIFT | Modifiers::CONTROL)
        );
        assert_eq!(Modifiers::from_mask(flags::OPTION | 0x0001_0000), None);
        assert_eq!(Modifiers::from_mask(0), Some(Modifiers::NONE));
    }

    #[test]
    fn test_mask_conversion_is_lossless() {
        for bits in 0..=0b1111u8 {
            let m = Modifiers::from_bits_truncate(bits);
            assert_eq!(Modifiers::from_mask(m.to_mask()), Some(m));
        }
    }

    #[test]
    fn test_display_orders_glyphs() {
        let m = Modifiers::COMMAND | Modifiers::SHIFT | Modifiers::CONTROL;
        assert_eq!(m.to_string(), "⇧⌃⌘");
    }

    #[test]
    fn test_modifier_keycodes() {
        assert_eq!(modifier_for_keycode(keycode::SHIFT), Some(Modifiers::SHIFT));
        assert_eq!(
            modifier_for_keycode(keycode::RIGHT_OPTION),
            Some(Modifiers::OPTION)
        );
        assert_eq!(modifier_for_keycode(keycode::CAPS_LOCK), None);
        assert_eq!(modifier_for_keycode(keycode::SPACE), None);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(keycode::SPACE), "Space");
        assert_eq!(key_name(keycode::SHIFT), "⇧");
        assert_eq!(key_name(0xC8), "key 0xC8");
    }
}
