//! Binary report formats shared with the virtual HID driver.
//!
//! Every report travels inside a fixed-size control report:
//!
//! ```text
//!  0          1             2                     2+len            64
//! ┌──────────┬─────────────┬─────────────────────┬────────────────┐
//! │ report_id│ payload_len │ payload             │ zero padding   │
//! └──────────┴─────────────┴─────────────────────┴────────────────┘
//! ```
//!
//! Payloads (all little-endian):
//!
//! ```text
//! keyboard   [0x01, modifiers, k0, k1, k2, k3, k4, k5]
//! absolute   [0x02, buttons, x_lo, x_hi, y_lo, y_hi, hwheel, vwheel]
//! relative   [0x03, buttons, dx_lo, dx_hi, dy_lo, dy_hi, hwheel, vwheel]
//! ```
//!
//! The sizes below are a binary contract with the driver.  They are checked
//! at compile time so that a change on one side cannot silently produce
//! reports the other side misreads.

use super::HidError;

/// Report id of the control report envelope.
pub const CONTROL_REPORT_ID: u8 = 0x01;

/// Total size of a control report, including id and length bytes.
pub const CONTROL_REPORT_SIZE: usize = 64;

/// Bytes of the envelope before the payload.
pub const CONTROL_HEADER_SIZE: usize = 2;

/// Number of non-modifier keys a keyboard report can carry.
pub const MAX_KEY_CODES: usize = 6;

/// Lowest logical coordinate of the absolute pointer.
pub const MOUSE_LOGICAL_MIN: u16 = 0;

/// Highest logical coordinate of the absolute pointer.
pub const MOUSE_LOGICAL_MAX: u16 = 0x7FFF;

pub const KEYBOARD_REPORT_ID: u8 = 0x01;
pub const ABSOLUTE_MOUSE_REPORT_ID: u8 = 0x02;
pub const RELATIVE_MOUSE_REPORT_ID: u8 = 0x03;

pub const KEYBOARD_REPORT_SIZE: usize = 2 + MAX_KEY_CODES;
pub const ABSOLUTE_MOUSE_REPORT_SIZE: usize = 8;
pub const RELATIVE_MOUSE_REPORT_SIZE: usize = 8;

const _: () = assert!(CONTROL_HEADER_SIZE + KEYBOARD_REPORT_SIZE <= CONTROL_REPORT_SIZE);
const _: () = assert!(CONTROL_HEADER_SIZE + ABSOLUTE_MOUSE_REPORT_SIZE <= CONTROL_REPORT_SIZE);
const _: () = assert!(CONTROL_HEADER_SIZE + RELATIVE_MOUSE_REPORT_SIZE <= CONTROL_REPORT_SIZE);
const _: () = assert!(CONTROL_REPORT_SIZE - CONTROL_HEADER_SIZE <= u8::MAX as usize);

/// Current keyboard state as the driver sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub key_codes: [u8; MAX_KEY_CODES],
}

impl KeyboardReport {
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut out = [0u8; KEYBOARD_REPORT_SIZE];
        out[0] = KEYBOARD_REPORT_ID;
        out[1] = self.modifiers;
        out[2..].copy_from_slice(&self.key_codes);
        out
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        let mut key_codes = [0u8; MAX_KEY_CODES];
        key_codes.copy_from_slice(&bytes[2..KEYBOARD_REPORT_SIZE]);
        Self {
            modifiers: bytes[1],
            key_codes,
        }
    }
}

/// Absolute pointer report; coordinates are already in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct AbsoluteMouseReport {
    pub buttons: u8,
    pub x: u16,
    pub y: u16,
    pub hwheel: i8,
    pub vwheel: i8,
}

impl AbsoluteMouseReport {
    pub fn to_bytes(&self) -> [u8; ABSOLUTE_MOUSE_REPORT_SIZE] {
        let x = self.x.to_le_bytes();
        let y = self.y.to_le_bytes();
        [
            ABSOLUTE_MOUSE_REPORT_ID,
            self.buttons,
            x[0],
            x[1],
            y[0],
            y[1],
            self.hwheel as u8,
            self.vwheel as u8,
        ]
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buttons: bytes[1],
            x: u16::from_le_bytes([bytes[2], bytes[3]]),
            y: u16::from_le_bytes([bytes[4], bytes[5]]),
            hwheel: bytes[6] as i8,
            vwheel: bytes[7] as i8,
        }
    }
}

/// Relative pointer report carrying signed deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RelativeMouseReport {
    pub buttons: u8,
    pub dx: i16,
    pub dy: i16,
    pub hwheel: i8,
    pub vwheel: i8,
}

impl RelativeMouseReport {
    pub fn to_bytes(&self) -> [u8; RELATIVE_MOUSE_REPORT_SIZE] {
        let dx = self.dx.to_le_bytes();
        let dy = self.dy.to_le_bytes();
        [
            RELATIVE_MOUSE_REPORT_ID,
            self.buttons,
            dx[0],
            dx[1],
            dy[0],
            dy[1],
            self.hwheel as u8,
            self.vwheel as u8,
        ]
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buttons: bytes[1],
            dx: i16::from_le_bytes([bytes[2], bytes[3]]),
            dy: i16::from_le_bytes([bytes[4], bytes[5]]),
            hwheel: bytes[6] as i8,
            vwheel: bytes[7] as i8,
        }
    }
}

/// Any report that can be placed in a control report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HidReport {
    Keyboard(KeyboardReport),
    AbsoluteMouse(AbsoluteMouseReport),
    RelativeMouse(RelativeMouseReport),
}

impl From<KeyboardReport> for HidReport {
    fn from(r: KeyboardReport) -> Self {
        HidReport::Keyboard(r)
    }
}

impl From<AbsoluteMouseReport> for HidReport {
    fn from(r: AbsoluteMouseReport) -> Self {
        HidReport::AbsoluteMouse(r)
    }
}

impl From<RelativeMouseReport> for HidReport {
    fn from(r: RelativeMouseReport) -> Self {
        HidReport::RelativeMouse(r)
    }
}

/// The fixed-size envelope written to the driver's control interface.
pub struct ControlReport;

impl ControlReport {
    /// Serializes `report` into a zero-padded control report.
    pub fn wrap(report: &HidReport) -> [u8; CONTROL_REPORT_SIZE] {
        let mut out = [0u8; CONTROL_REPORT_SIZE];
        out[0] = CONTROL_REPORT_ID;
        let len = match report {
            HidReport::Keyboard(r) => copy_payload(&mut out, &r.to_bytes()),
            HidReport::AbsoluteMouse(r) => copy_payload(&mut out, &r.to_bytes()),
            HidReport::RelativeMouse(r) => copy_payload(&mut out, &r.to_bytes()),
        };
        out[1] = len as u8;
        out
    }

    /// Parses a control report back into the report it carries.
    ///
    /// Used by the driver-side tooling and by tests that inspect what a
    /// client wrote.
    pub fn parse(bytes: &[u8]) -> Result<HidReport, HidError> {
        if bytes.len() != CONTROL_REPORT_SIZE {
            return Err(HidError::MalformedReport("control report has the wrong size"));
        }
        if bytes[0] != CONTROL_REPORT_ID {
            return Err(HidError::MalformedReport("unexpected control report id"));
        }
        let len = bytes[1] as usize;
        let payload = bytes
            .get(CONTROL_HEADER_SIZE..CONTROL_HEADER_SIZE + len)
            .ok_or(HidError::MalformedReport("payload length exceeds report"))?;
        match (payload.first().copied(), len) {
            (Some(KEYBOARD_REPORT_ID), KEYBOARD_REPORT_SIZE) => {
                Ok(HidReport::Keyboard(KeyboardReport::from_bytes(payload)))
            }
            (Some(ABSOLUTE_MOUSE_REPORT_ID), ABSOLUTE_MOUSE_REPORT_SIZE) => {
                Ok(HidReport::AbsoluteMouse(AbsoluteMouseReport::from_bytes(payload)))
            }
            (Some(RELATIVE_MOUSE_REPORT_ID), RELATIVE_MOUSE_REPORT_SIZE) => {
                Ok(HidReport::RelativeMouse(RelativeMouseReport::from_bytes(payload)))
            }
            _ => Err(HidError::MalformedReport("unknown payload id or length")),
        }
    }
}

fn copy_payload(out: &mut [u8; CONTROL_REPORT_SIZE], payload: &[u8]) -> usize {
    out[CONTROL_HEADER_SIZE..CONTROL_HEADER_SIZE + payload.len()].copy_from_slice(payload);
    payload.len()
}
