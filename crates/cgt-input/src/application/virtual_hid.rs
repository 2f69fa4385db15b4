//! VirtualHidClient: keeps keyboard and mouse state and writes a report on
//! every change.
//!
//! Every operation updates the in-memory state first and writes second.  A
//! failed write is returned to the caller (and logged) but the state keeps
//! the change, so the next successful write brings the device back in line
//! with what the caller asked for.  Failed writes are never retried: the
//! next input event supersedes the stale one.

use cgt_core::hid::{
    ControlReport, HidError, HidReport, KeyboardState, LogicalPosition, MouseButton, MouseState, Viewport,
    CONTROL_REPORT_SIZE,
};
use cgt_core::keymap::{HidKeyCode, KeyMapper};
use tracing::{debug, warn};

/// Writes one control report to the virtual device.
///
/// Implemented by the HID transport in the infrastructure layer and by
/// recording mocks in tests.
pub trait ReportWriter {
    /// Writes `report` synchronously.  OS failures come back as
    /// [`HidError::Transport`] carrying the OS error code unchanged.
    fn write_report(&mut self, report: &[u8; CONTROL_REPORT_SIZE]) -> Result<(), HidError>;
}

impl<W: ReportWriter + ?Sized> ReportWriter for Box<W> {
    fn write_report(&mut self, report: &[u8; CONTROL_REPORT_SIZE]) -> Result<(), HidError> {
        (**self).write_report(report)
    }
}

pub struct VirtualHidClient<W: ReportWriter> {
    writer: W,
    keyboard: KeyboardState,
    absolute: MouseState,
    relative: MouseState,
}

impl<W: ReportWriter> VirtualHidClient<W> {
    /// Wraps `writer` and sends an all-released keyboard report, so keys left
    /// held by a previous client do not stick.
    pub fn new(writer: W, viewport: Viewport) -> Result<Self, HidError> {
        let mut client = Self {
            writer,
            keyboard: KeyboardState::new(),
            absolute: MouseState::new(viewport),
            relative: MouseState::new(viewport),
        };
        client.reset()?;
        Ok(client)
    }

    pub fn keyboard_state(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn absolute_state(&self) -> &MouseState {
        &self.absolute
    }

    pub fn relative_state(&self) -> &MouseState {
        &self.relative
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Updates the screen size used by [`VirtualHidClient::to_logical`].
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.absolute.set_viewport(viewport);
        self.relative.set_viewport(viewport);
    }

    /// Scales a screen pixel into the absolute pointer's logical range.
    pub fn to_logical(&self, screen_x: i32, screen_y: i32) -> LogicalPosition {
        self.absolute.to_logical(screen_x, screen_y)
    }

    /// Holds `key`.
    ///
    /// [`HidKeyCode::Unknown`] is absorbed without a write.  A seventh
    /// distinct non-modifier key fails with [`HidError::Rollover`] and leaves
    /// the state unchanged.
    pub fn press(&mut self, key: HidKeyCode) -> Result<(), HidError> {
        if key == HidKeyCode::Unknown {
            return Ok(());
        }
        self.keyboard.press(key)?;
        self.write_keyboard()
    }

    /// Releases `key`.  Releasing a key that is not held succeeds.
    pub fn release(&mut self, key: HidKeyCode) -> Result<(), HidError> {
        if key == HidKeyCode::Unknown {
            return Ok(());
        }
        self.keyboard.release(key);
        self.write_keyboard()
    }

    /// Presses the key a host virtual-key code maps to.
    pub fn press_by_host_code(&mut self, vk: u8) -> Result<(), HidError> {
        let key = KeyMapper::host_to_scancode(vk);
        if key == HidKeyCode::Unknown {
            debug!(vk, "host key has no HID equivalent; ignored");
        }
        self.press(key)
    }

    pub fn release_by_host_code(&mut self, vk: u8) -> Result<(), HidError> {
        self.release(KeyMapper::host_to_scancode(vk))
    }

    /// Releases every key and button.
    ///
    /// Always writes one keyboard report; pointer reports are written only
    /// for a pointer that had buttons held.
    pub fn reset(&mut self) -> Result<(), HidError> {
        self.keyboard.reset();
        self.write_keyboard()?;

        if self.absolute.buttons() != 0 {
            self.absolute.reset();
            self.write(self.absolute.absolute_report(0, 0).into())?;
        }
        if self.relative.buttons() != 0 {
            self.relative.reset();
            self.write(self.relative.relative_report(0, 0, 0, 0).into())?;
        }
        Ok(())
    }

    /// The absolute pointer: positions are logical coordinates in
    /// `0..=MOUSE_LOGICAL_MAX`.
    pub fn absolute(&mut self) -> AbsolutePointer<'_, W> {
        AbsolutePointer { client: self }
    }

    /// The relative pointer: motion is reported as signed deltas.
    pub fn relative(&mut self) -> RelativePointer<'_, W> {
        RelativePointer { client: self }
    }

    fn write_keyboard(&mut self) -> Result<(), HidError> {
        let report = self.keyboard.report();
        self.write(report.into())
    }

    fn write(&mut self, report: HidReport) -> Result<(), HidError> {
        let bytes = ControlReport::wrap(&report);
        self.writer.write_report(&bytes).map_err(|e| {
            warn!(?report, "virtual HID write failed: {e}");
            e
        })
    }
}

impl<W: ReportWriter> Drop for VirtualHidClient<W> {
    fn drop(&mut self) {
        let _ = self.reset();
    }
}

/// Absolute pointer operations of a [`VirtualHidClient`].
pub struct AbsolutePointer<'a, W: ReportWriter> {
    client: &'a mut VirtualHidClient<W>,
}

impl<W: ReportWriter> AbsolutePointer<'_, W> {
    pub fn move_to(&mut self, x: u16, y: u16) -> Result<(), HidError> {
        self.client.absolute.set_position(x, y);
        self.emit(0, 0)
    }

    pub fn button_press(&mut self, button: MouseButton, x: u16, y: u16) -> Result<(), HidError> {
        self.client.absolute.press(button);
        self.client.absolute.set_position(x, y);
        self.emit(0, 0)
    }

    pub fn button_release(&mut self, button: MouseButton, x: u16, y: u16) -> Result<(), HidError> {
        self.client.absolute.release(button);
        self.client.absolute.set_position(x, y);
        self.emit(0, 0)
    }

    /// Scrolls at the current position.
    pub fn wheel(&mut self, hwheel: i8, vwheel: i8) -> Result<(), HidError> {
        self.emit(hwheel, vwheel)
    }

    fn emit(&mut self, hwheel: i8, vwheel: i8) -> Result<(), HidError> {
        let report = self.client.absolute.absolute_report(hwheel, vwheel);
        self.client.write(report.into())
    }
}

/// Relative pointer operations of a [`VirtualHidClient`].
pub struct RelativePointer<'a, W: ReportWriter> {
    client: &'a mut VirtualHidClient<W>,
}

impl<W: ReportWriter> RelativePointer<'_, W> {
    pub fn move_by(&mut self, dx: i16, dy: i16) -> Result<(), HidError> {
        self.emit(dx, dy, 0, 0)
    }

    pub fn button_press(&mut self, button: MouseButton) -> Result<(), HidError> {
        self.client.relative.press(button);
        self.emit(0, 0, 0, 0)
    }

    pub fn button_release(&mut self, button: MouseButton) -> Result<(), HidError> {
        self.client.relative.release(button);
        self.emit(0, 0, 0, 0)
    }

    pub fn wheel(&mut self, hwheel: i8, vwheel: i8) -> Result<(), HidError> {
        self.emit(0, 0, hwheel, vwheel)
    }

    fn emit(&mut self, dx: i16, dy: i16, hwheel: i8, vwheel: i8) -> Result<(), HidError> {
        let report = self.client.relative.relative_report(dx, dy, hwheel, vwheel);
        self.client.write(report.into())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
