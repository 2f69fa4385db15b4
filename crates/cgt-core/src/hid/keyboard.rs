//! Keyboard state: one modifier byte plus six key slots.

use super::report::{KeyboardReport, MAX_KEY_CODES};
use super::HidError;
use crate::keymap::HidKeyCode;

/// Keys currently held on the virtual keyboard.
///
/// Empty key slots hold `0`, the same value as [`HidKeyCode::Unknown`], so
/// `Unknown` is never stored as a held key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardState {
    modifiers: u8,
    key_codes: [u8; MAX_KEY_CODES],
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    pub fn key_codes(&self) -> [u8; MAX_KEY_CODES] {
        self.key_codes
    }

    /// Marks `key` as held.
    ///
    /// Modifiers set their bit and never use a key slot.  Pressing a key that
    /// is already held changes nothing.  When all six slots are taken by
    /// other keys the press fails with [`HidError::Rollover`] and the state
    /// is left as it was.
    pub fn press(&mut self, key: HidKeyCode) -> Result<(), HidError> {
        if key == HidKeyCode::Unknown {
            return Ok(());
        }
        if let Some(bit) = key.modifier_bit() {
            self.modifiers |= bit;
            return Ok(());
        }
        let code = key.as_u8();
        if self.key_codes.contains(&code) {
            return Ok(());
        }
        match self.key_codes.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = code;
                Ok(())
            }
            None => Err(HidError::Rollover { rejected: key }),
        }
    }

    /// Marks `key` as released.  Releasing a key that is not held is a no-op.
    pub fn release(&mut self, key: HidKeyCode) {
        if key == HidKeyCode::Unknown {
            return;
        }
        if let Some(bit) = key.modifier_bit() {
            self.modifiers &= !bit;
            return;
        }
        let code = key.as_u8();
        for slot in self.key_codes.iter_mut().filter(|slot| **slot == code) {
            *slot = 0;
        }
    }

    pub fn is_held(&self, key: HidKeyCode) -> bool {
        match key.modifier_bit() {
            Some(bit) => self.modifiers & bit != 0,
            None => key != HidKeyCode::Unknown && self.key_codes.contains(&key.as_u8()),
        }
    }

    /// Releases every key and modifier.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) -> KeyboardReport {
        KeyboardReport {
            modifiers: self.modifiers,
            key_codes: self.key_codes,
        }
    }
}
