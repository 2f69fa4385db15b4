//! Virtual HID reports and the keyboard/mouse state machines behind them.
//!
//! The state types here are pure: they update in-memory state and produce
//! reports.  Writing a report to the device is the job of the input client,
//! which always updates state first and writes second, so a failed write
//! never desynchronizes the state from what the caller asked for.

pub mod keyboard;
pub mod mouse;
pub mod report;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::HidKeyCode;

pub use keyboard::KeyboardState;
pub use mouse::{LogicalPosition, MouseButton, MouseState, Viewport};
pub use report::{
    AbsoluteMouseReport, ControlReport, HidReport, KeyboardReport, RelativeMouseReport, CONTROL_REPORT_ID,
    CONTROL_REPORT_SIZE, MAX_KEY_CODES, MOUSE_LOGICAL_MAX, MOUSE_LOGICAL_MIN,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HidError {
    /// All six key slots are held by other keys.
    #[error("keyboard rollover: cannot hold {rejected:?} in addition to {MAX_KEY_CODES} keys")]
    Rollover { rejected: HidKeyCode },

    /// The report write failed; `code` is the OS error code, unmodified.
    #[error("HID report write failed with OS error {code}")]
    Transport { code: i32 },

    #[error("malformed HID report: {0}")]
    MalformedReport(&'static str),
}

/// A usage page / usage pair identifying one top-level HID collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsagePair {
    pub usage_page: u16,
    pub usage: u16,
}

/// Identifies the virtual HID device and its two interfaces.
///
/// The defaults are the values the virtual driver registers with; a config
/// file only needs to override them for a custom driver build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidDeviceSelector {
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    #[serde(default = "default_product_id")]
    pub product_id: u16,
    /// Interface that receives control reports.
    #[serde(default = "default_control")]
    pub control: UsagePair,
    /// Interface the driver uses to send messages back to the client.
    #[serde(default = "default_message")]
    pub message: UsagePair,
}

fn default_vendor_id() -> u16 {
    0x1209
}
fn default_product_id() -> u16 {
    0xC617
}
fn default_control() -> UsagePair {
    UsagePair {
        usage_page: 0xFF00,
        usage: 0x0001,
    }
}
fn default_message() -> UsagePair {
    UsagePair {
        usage_page: 0xFF00,
        usage: 0x0002,
    }
}

impl Default for HidDeviceSelector {
    fn default() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            control: default_control(),
            message: default_message(),
        }
    }
}

impl HidDeviceSelector {
    pub fn matches_device(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_defaults_use_distinct_interfaces() {
        let selector = HidDeviceSelector::default();
        assert_ne!(selector.control, selector.message);
        assert!(selector.matches_device(0x1209, 0xC617));
        assert!(!selector.matches_device(0x1209, 0x0001));
    }

    #[test]
    fn test_selector_partial_toml_keeps_defaults() {
        let selector: HidDeviceSelector = toml::from_str("product_id = 7").expect("deserialize");
        assert_eq!(selector.product_id, 7);
        assert_eq!(selector.vendor_id, HidDeviceSelector::default().vendor_id);
        assert_eq!(selector.control, HidDeviceSelector::default().control);
    }

    #[test]
    fn test_transport_error_keeps_os_code() {
        let err = HidError::Transport { code: 31 };
        assert!(err.to_string().contains("31"));
    }
}
