//! Key code translation between the host input API and device scancodes.
//!
//! Device scancodes (USB HID Usage IDs) are the canonical representation.
//! Host virtual-key codes are translated at the edge of the input client.

pub mod hid;
pub mod windows_vk;

pub use hid::HidKeyCode;

/// Translation entry point used by the virtual HID client.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a host virtual-key code to a device scancode.
    ///
    /// Returns [`HidKeyCode::Unknown`] if no mapping exists for `vk`.
    pub fn host_to_scancode(vk: u8) -> HidKeyCode {
        windows_vk::vk_to_hid(vk)
    }

    /// Translates a device scancode to a host virtual-key code (diagnostics only).
    pub fn scancode_to_host(hid: HidKeyCode) -> Option<u8> {
        windows_vk::hid_to_vk(hid)
    }
}
