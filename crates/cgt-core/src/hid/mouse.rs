//! Mouse state shared by the absolute and relative pointer modes.
//!
//! Buttons and position are independent: a move keeps the buttons held, a
//! button change keeps the position unless new coordinates come with it.

use serde::{Deserialize, Serialize};

use super::report::{AbsoluteMouseReport, RelativeMouseReport, MOUSE_LOGICAL_MAX, MOUSE_LOGICAL_MIN};

/// Mouse buttons and their bit in the report's button byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MouseButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x04,
    Back = 0x08,
    Forward = 0x10,
}

impl MouseButton {
    pub fn bit(self) -> u8 {
        self as u8
    }

    /// Parses the button names accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(MouseButton::Left),
            "right" => Some(MouseButton::Right),
            "middle" => Some(MouseButton::Middle),
            "back" | "x1" => Some(MouseButton::Back),
            "forward" | "x2" => Some(MouseButton::Forward),
            _ => None,
        }
    }
}

/// Pointer position in logical device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct LogicalPosition {
    pub x: u16,
    pub y: u16,
}

/// Size of the host screen that absolute coordinates are scaled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseState {
    buttons: u8,
    position: LogicalPosition,
    viewport: Viewport,
}

impl MouseState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            buttons: 0,
            position: LogicalPosition::default(),
            viewport,
        }
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    pub fn position(&self) -> LogicalPosition {
        self.position
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn press(&mut self, button: MouseButton) {
        self.buttons |= button.bit();
    }

    pub fn release(&mut self, button: MouseButton) {
        self.buttons &= !button.bit();
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.buttons & button.bit() != 0
    }

    /// Stores a position that is already in logical units.
    ///
    /// Values above [`MOUSE_LOGICAL_MAX`] are a caller error and are not
    /// checked here.
    pub fn set_position(&mut self, x: u16, y: u16) {
        self.position = LogicalPosition { x, y };
    }

    /// Scales a screen pixel coordinate into the logical range.
    ///
    /// Pixels outside the viewport are clamped to its edges.
    pub fn to_logical(&self, screen_x: i32, screen_y: i32) -> LogicalPosition {
        LogicalPosition {
            x: scale_axis(screen_x, self.viewport.width),
            y: scale_axis(screen_y, self.viewport.height),
        }
    }

    /// Releases all buttons and returns the pointer to the origin.
    pub fn reset(&mut self) {
        self.buttons = 0;
        self.position = LogicalPosition::default();
    }

    pub fn absolute_report(&self, hwheel: i8, vwheel: i8) -> AbsoluteMouseReport {
        AbsoluteMouseReport {
            buttons: self.buttons,
            x: self.position.x,
            y: self.position.y,
            hwheel,
            vwheel,
        }
    }

    pub fn relative_report(&self, dx: i16, dy: i16, hwheel: i8, vwheel: i8) -> RelativeMouseReport {
        RelativeMouseReport {
            buttons: self.buttons,
            dx,
            dy,
            hwheel,
            vwheel,
        }
    }
}

fn scale_axis(pixel: i32, extent: u32) -> u16 {
    if extent <= 1 {
        return MOUSE_LOGICAL_MIN;
    }
    let last = i64::from(extent) - 1;
    let clamped = i64::from(pixel).clamp(0, last);
    let span = i64::from(MOUSE_LOGICAL_MAX - MOUSE_LOGICAL_MIN);
    (i64::from(MOUSE_LOGICAL_MIN) + clamped * span / last) as u16
}
