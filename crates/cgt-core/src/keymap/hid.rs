//! Device scancodes: USB HID Usage IDs on the Keyboard/Keypad page (0x07).
//!
//! The virtual HID driver consumes boot-protocol style keyboard reports, so
//! every key the client can hold is identified by its one-byte Usage ID.
//! Host input codes (Windows virtual keys) are translated into this space by
//! [`super::windows_vk`] before they reach the keyboard state machine.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10.
//!
//! # Scancodes are positions, not characters
//!
//! | Key          | Usage ID |
//! |--------------|----------|
//! | Letter A     | 0x04     |
//! | Enter        | 0x28     |
//! | F13          | 0x68     |
//! | Left Ctrl    | 0xE0     |
//!
//! The character a key produces is decided by the layout configured inside
//! the guest OS, so the client never needs to know about AZERTY or Dvorak.
//!
//! # The `Unknown` sentinel
//!
//! [`HidKeyCode::Unknown`] (0x00) is the "no key" value.  It doubles as the
//! empty marker in the six key-code slots of a keyboard report, which is why
//! the state machine never stores it as a held key.

use serde::{Deserialize, Serialize};

/// Usage ID of the first modifier key (Left Control).
pub const MODIFIER_USAGE_FIRST: u8 = 0xE0;

/// Usage ID of the last modifier key (Right GUI).
pub const MODIFIER_USAGE_LAST: u8 = 0xE7;

/// USB HID Usage ID for keyboard keys (page 0x07).
///
/// The discriminant of each variant is the byte written into keyboard reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation (0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    CapsLock = 0x39,

    // Function keys F1–F12 (0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster (0x46–0x52)
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Numpad (0x53–0x63)
    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59,
    Numpad2 = 0x5A,
    Numpad3 = 0x5B,
    Numpad4 = 0x5C,
    Numpad5 = 0x5D,
    Numpad6 = 0x5E,
    Numpad7 = 0x5F,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,
    NumpadDecimal = 0x63,

    IntlBackslash = 0x64,
    ContextMenu = 0x65,

    // Function keys F13–F24 (0x68–0x73)
    F13 = 0x68,
    F14 = 0x69,
    F15 = 0x6A,
    F16 = 0x6B,
    F17 = 0x6C,
    F18 = 0x6D,
    F19 = 0x6E,
    F20 = 0x6F,
    F21 = 0x70,
    F22 = 0x71,
    F23 = 0x72,
    F24 = 0x73,

    // Modifiers (0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,

    /// "No key".  Also the empty marker in report key-code slots.
    Unknown = 0x00,
}

impl HidKeyCode {
    /// Converts a raw Usage ID to a [`HidKeyCode`].
    ///
    /// Returns [`HidKeyCode::Unknown`] for unassigned or unsupported values.
    pub fn from_u8(value: u8) -> Self {
        use HidKeyCode::*;
        match value {
            0x04 => KeyA,
            0x05 => KeyB,
            0x06 => KeyC,
            0x07 => KeyD,
            0x08 => KeyE,
            0x09 => KeyF,
            0x0A => KeyG,
            0x0B => KeyH,
            0x0C => KeyI,
            0x0D => KeyJ,
            0x0E => KeyK,
            0x0F => KeyL,
            0x10 => KeyM,
            0x11 => KeyN,
            0x12 => KeyO,
            0x13 => KeyP,
            0x14 => KeyQ,
            0x15 => KeyR,
            0x16 => KeyS,
            0x17 => KeyT,
            0x18 => KeyU,
            0x19 => KeyV,
            0x1A => KeyW,
            0x1B => KeyX,
            0x1C => KeyY,
            0x1D => KeyZ,
            0x1E => Digit1,
            0x1F => Digit2,
            0x20 => Digit3,
            0x21 => Digit4,
            0x22 => Digit5,
            0x23 => Digit6,
            0x24 => Digit7,
            0x25 => Digit8,
            0x26 => Digit9,
            0x27 => Digit0,
            0x28 => Enter,
            0x29 => Escape,
            0x2A => Backspace,
            0x2B => Tab,
            0x2C => Space,
            0x2D => Minus,
            0x2E => Equal,
            0x2F => BracketLeft,
            0x30 => BracketRight,
            0x31 => Backslash,
            0x33 => Semicolon,
            0x34 => Quote,
            0x35 => Backquote,
            0x36 => Comma,
            0x37 => Period,
            0x38 => Slash,
            0x39 => CapsLock,
            0x3A => F1,
            0x3B => F2,
            0x3C => F3,
            0x3D => F4,
            0x3E => F5,
            0x3F => F6,
            0x40 => F7,
            0x41 => F8,
            0x42 => F9,
            0x43 => F10,
            0x44 => F11,
            0x45 => F12,
            0x46 => PrintScreen,
            0x47 => ScrollLock,
            0x48 => Pause,
            0x49 => Insert,
            0x4A => Home,
            0x4B => PageUp,
            0x4C => Delete,
            0x4D => End,
            0x4E => PageDown,
            0x4F => ArrowRight,
            0x50 => ArrowLeft,
            0x51 => ArrowDown,
            0x52 => ArrowUp,
            0x53 => NumLock,
            0x54 => NumpadDivide,
            0x55 => NumpadMultiply,
            0x56 => NumpadSubtract,
            0x57 => NumpadAdd,
            0x58 => NumpadEnter,
            0x59 => Numpad1,
            0x5A => Numpad2,
            0x5B => Numpad3,
            0x5C => Numpad4,
            0x5D => Numpad5,
            0x5E => Numpad6,
            0x5F => Numpad7,
            0x60 => Numpad8,
            0x61 => Numpad9,
            0x62 => Numpad0,
            0x63 => NumpadDecimal,
            0x64 => IntlBackslash,
            0x65 => ContextMenu,
            0x68 => F13,
            0x69 => F14,
            0x6A => F15,
            0x6B => F16,
            0x6C => F17,
            0x6D => F18,
            0x6E => F19,
            0x6F => F20,
            0x70 => F21,
            0x71 => F22,
            0x72 => F23,
            0x73 => F24,
            0xE0 => ControlLeft,
            0xE1 => ShiftLeft,
            0xE2 => AltLeft,
            0xE3 => MetaLeft,
            0xE4 => ControlRight,
            0xE5 => ShiftRight,
            0xE6 => AltRight,
            0xE7 => MetaRight,
            _ => Unknown,
        }
    }

    /// Returns the Usage ID byte written into reports.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the eight modifier keys (Ctrl/Shift/Alt/Meta, left and right).
    pub fn is_modifier(self) -> bool {
        (MODIFIER_USAGE_FIRST..=MODIFIER_USAGE_LAST).contains(&self.as_u8())
    }

    /// Returns the bit this key occupies in the report's modifier byte.
    ///
    /// The HID boot keyboard layout assigns bit `n` to Usage ID `0xE0 + n`.
    /// Returns `None` for non-modifier keys.
    pub fn modifier_bit(self) -> Option<u8> {
        if self.is_modifier() {
            Some(1 << (self.as_u8() - MODIFIER_USAGE_FIRST))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD_KEYS: &[(u8, HidKeyCode)] = &[
        (0x04, HidKeyCode::KeyA),
        (0x1D, HidKeyCode::KeyZ),
        (0x1E, HidKeyCode::Digit1),
        (0x27, HidKeyCode::Digit0),
        (0x28, HidKeyCode::Enter),
        (0x2C, HidKeyCode::Space),
        (0x39, HidKeyCode::CapsLock),
        (0x3A, HidKeyCode::F1),
        (0x45, HidKeyCode::F12),
        (0x52, HidKeyCode::ArrowUp),
        (0x58, HidKeyCode::NumpadEnter),
        (0x64, HidKeyCode::IntlBackslash),
        (0x65, HidKeyCode::ContextMenu),
        (0x68, HidKeyCode::F13),
        (0x73, HidKeyCode::F24),
        (0xE0, HidKeyCode::ControlLeft),
        (0xE7, HidKeyCode::MetaRight),
    ];

    #[test]
    fn test_from_u8_produces_expected_codes() {
        for &(raw, expected) in STANDARD_KEYS {
            assert_eq!(
                HidKeyCode::from_u8(raw),
                expected,
                "from_u8(0x{raw:02X}) should produce {expected:?}"
            );
        }
    }

    #[test]
    fn test_from_u8_is_inverse_of_as_u8_for_every_assigned_value() {
        for raw in 0u8..=255 {
            let code = HidKeyCode::from_u8(raw);
            if code != HidKeyCode::Unknown {
                assert_eq!(code.as_u8(), raw, "round-trip for 0x{raw:02X} failed");
            }
        }
    }

    #[test]
    fn test_unassigned_values_map_to_unknown() {
        for raw in [0x00u8, 0x01, 0x02, 0x03, 0x32, 0x66, 0x67, 0x74, 0xA0, 0xE8, 0xFF] {
            assert_eq!(HidKeyCode::from_u8(raw), HidKeyCode::Unknown);
        }
    }

    #[test]
    fn test_unknown_is_the_zero_sentinel() {
        assert_eq!(HidKeyCode::Unknown.as_u8(), 0x00);
        assert!(!HidKeyCode::Unknown.is_modifier());
    }

    #[test]
    fn test_modifier_bits_follow_boot_keyboard_layout() {
        let expected = [
            (HidKeyCode::ControlLeft, 0x01),
            (HidKeyCode::ShiftLeft, 0x02),
            (HidKeyCode::AltLeft, 0x04),
            (HidKeyCode::MetaLeft, 0x08),
            (HidKeyCode::ControlRight, 0x10),
            (HidKeyCode::ShiftRight, 0x20),
            (HidKeyCode::AltRight, 0x40),
            (HidKeyCode::MetaRight, 0x80),
        ];
        for (key, bit) in expected {
            assert_eq!(key.modifier_bit(), Some(bit), "{key:?}");
        }
    }

    #[test]
    fn test_non_modifiers_have_no_modifier_bit() {
        for key in [HidKeyCode::KeyA, HidKeyCode::Enter, HidKeyCode::F24, HidKeyCode::Unknown] {
            assert!(!key.is_modifier(), "{key:?} should NOT be a modifier key");
            assert_eq!(key.modifier_bit(), None);
        }
    }
}
