//! Host virtual-key (Windows `VK_*`) to device scancode translation.
//!
//! Remote input arrives from the streaming client expressed in the Windows
//! virtual-key numbering space (0x00–0xFF) regardless of the client's own OS.
//! The virtual HID keyboard, on the other hand, speaks USB HID Usage IDs.
//! This module is the one place where the two meet.
//!
//! The mapping is a compile-time array of 256 entries, so translation is a
//! single index and is total: every `u8` has an entry, and codes without a
//! keyboard equivalent (mouse-button VKs, IME and browser keys, OEM vendor
//! codes) hold [`HidKeyCode::Unknown`].  The state machine silently absorbs
//! `Unknown`, which is how unsupported host keys get dropped.
//!
//! The generic modifier codes `VK_SHIFT`, `VK_CONTROL` and `VK_MENU` carry no
//! side information, so they are mapped to the left-hand key.

use super::hid::HidKeyCode;

/// `VK_SHIFT`, `VK_CONTROL`, `VK_MENU`: modifiers without a left/right side.
const GENERIC_MODIFIER_VKS: [u8; 3] = [0x10, 0x11, 0x12];

/// Translates a host virtual-key code to a device scancode.
///
/// Never panics; unmapped codes return [`HidKeyCode::Unknown`].
pub fn vk_to_hid(vk: u8) -> HidKeyCode {
    VK_TO_HID_TABLE[vk as usize]
}

/// Translates a device scancode back to a host virtual-key code.
///
/// Side-specific modifier VKs are preferred over the generic ones.
/// Returns `None` for [`HidKeyCode::Unknown`] and for scancodes no VK produces.
pub fn hid_to_vk(hid: HidKeyCode) -> Option<u8> {
    if hid == HidKeyCode::Unknown {
        return None;
    }
    VK_TO_HID_TABLE
        .iter()
        .enumerate()
        .filter(|&(vk, _)| !GENERIC_MODIFIER_VKS.contains(&(vk as u8)))
        .find(|&(_, &mapped)| mapped == hid)
        .map(|(vk, _)| vk as u8)
}

/// Complete VK → scancode table indexed by VK code.
///
/// Reference: <https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes>
const VK_TO_HID_TABLE: [HidKeyCode; 256] = {
    use HidKeyCode::*;
    let mut t = [Unknown; 256];

    // Letters: VK_A=0x41 … VK_Z=0x5A
    t[0x41] = KeyA;
    t[0x42] = KeyB;
    t[0x43] = KeyC;
    t[0x44] = KeyD;
    t[0x45] = KeyE;
    t[0x46] = KeyF;
    t[0x47] = KeyG;
    t[0x48] = KeyH;
    t[0x49] = KeyI;
    t[0x4A] = KeyJ;
    t[0x4B] = KeyK;
    t[0x4C] = KeyL;
    t[0x4D] = KeyM;
    t[0x4E] = KeyN;
    t[0x4F] = KeyO;
    t[0x50] = KeyP;
    t[0x51] = KeyQ;
    t[0x52] = KeyR;
    t[0x53] = KeyS;
    t[0x54] = KeyT;
    t[0x55] = KeyU;
    t[0x56] = KeyV;
    t[0x57] = KeyW;
    t[0x58] = KeyX;
    t[0x59] = KeyY;
    t[0x5A] = KeyZ;

    // Digit row: VK_0=0x30 … VK_9=0x39
    t[0x30] = Digit0;
    t[0x31] = Digit1;
    t[0x32] = Digit2;
    t[0x33] = Digit3;
    t[0x34] = Digit4;
    t[0x35] = Digit5;
    t[0x36] = Digit6;
    t[0x37] = Digit7;
    t[0x38] = Digit8;
    t[0x39] = Digit9;

    t[0x08] = Backspace;   // VK_BACK
    t[0x09] = Tab;         // VK_TAB
    t[0x0D] = Enter;       // VK_RETURN
    t[0x13] = Pause;       // VK_PAUSE
    t[0x14] = CapsLock;    // VK_CAPITAL
    t[0x1B] = Escape;      // VK_ESCAPE
    t[0x20] = Space;       // VK_SPACE
    t[0x21] = PageUp;      // VK_PRIOR
    t[0x22] = PageDown;    // VK_NEXT
    t[0x23] = End;         // VK_END
    t[0x24] = Home;        // VK_HOME
    t[0x25] = ArrowLeft;   // VK_LEFT
    t[0x26] = ArrowUp;     // VK_UP
    t[0x27] = ArrowRight;  // VK_RIGHT
    t[0x28] = ArrowDown;   // VK_DOWN
    t[0x2C] = PrintScreen; // VK_SNAPSHOT
    t[0x2D] = Insert;      // VK_INSERT
    t[0x2E] = Delete;      // VK_DELETE
    t[0x5D] = ContextMenu; // VK_APPS
    t[0x91] = ScrollLock;  // VK_SCROLL

    // Numpad: VK_NUMPAD0=0x60 … VK_NUMPAD9=0x69
    t[0x60] = Numpad0;
    t[0x61] = Numpad1;
    t[0x62] = Numpad2;
    t[0x63] = Numpad3;
    t[0x64] = Numpad4;
    t[0x65] = Numpad5;
    t[0x66] = Numpad6;
    t[0x67] = Numpad7;
    t[0x68] = Numpad8;
    t[0x69] = Numpad9;
    t[0x6A] = NumpadMultiply; // VK_MULTIPLY
    t[0x6B] = NumpadAdd;      // VK_ADD
    t[0x6D] = NumpadSubtract; // VK_SUBTRACT
    t[0x6E] = NumpadDecimal;  // VK_DECIMAL
    t[0x6F] = NumpadDivide;   // VK_DIVIDE
    t[0x90] = NumLock;        // VK_NUMLOCK

    // Function keys: VK_F1=0x70 … VK_F24=0x87
    t[0x70] = F1;
    t[0x71] = F2;
    t[0x72] = F3;
    t[0x73] = F4;
    t[0x74] = F5;
    t[0x75] = F6;
    t[0x76] = F7;
    t[0x77] = F8;
    t[0x78] = F9;
    t[0x79] = F10;
    t[0x7A] = F11;
    t[0x7B] = F12;
    t[0x7C] = F13;
    t[0x7D] = F14;
    t[0x7E] = F15;
    t[0x7F] = F16;
    t[0x80] = F17;
    t[0x81] = F18;
    t[0x82] = F19;
    t[0x83] = F20;
    t[0x84] = F21;
    t[0x85] = F22;
    t[0x86] = F23;
    t[0x87] = F24;

    // OEM punctuation (US layout positions)
    t[0xBA] = Semicolon;     // VK_OEM_1
    t[0xBB] = Equal;         // VK_OEM_PLUS
    t[0xBC] = Comma;         // VK_OEM_COMMA
    t[0xBD] = Minus;         // VK_OEM_MINUS
    t[0xBE] = Period;        // VK_OEM_PERIOD
    t[0xBF] = Slash;         // VK_OEM_2
    t[0xC0] = Backquote;     // VK_OEM_3
    t[0xDB] = BracketLeft;   // VK_OEM_4
    t[0xDC] = Backslash;     // VK_OEM_5
    t[0xDD] = BracketRight;  // VK_OEM_6
    t[0xDE] = Quote;         // VK_OEM_7
    t[0xE2] = IntlBackslash; // VK_OEM_102

    // Modifiers
    t[0x10] = ShiftLeft;    // VK_SHIFT
    t[0x11] = ControlLeft;  // VK_CONTROL
    t[0x12] = AltLeft;      // VK_MENU
    t[0xA0] = ShiftLeft;    // VK_LSHIFT
    t[0xA1] = ShiftRight;   // VK_RSHIFT
    t[0xA2] = ControlLeft;  // VK_LCONTROL
    t[0xA3] = ControlRight; // VK_RCONTROL
    t[0xA4] = AltLeft;      // VK_LMENU
    t[0xA5] = AltRight;     // VK_RMENU
    t[0x5B] = MetaLeft;     // VK_LWIN
    t[0x5C] = MetaRight;    // VK_RWIN

    t
};
