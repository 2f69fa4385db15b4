//! Virtual HID transport: finds the virtual device and writes control reports.
//!
//! The virtual driver exposes two top-level collections on one device: the
//! *control* interface that receives reports and the *message* interface
//! the driver uses to talk back.  [`VirtualHidTransport::open`] enumerates
//! HID devices, keeps those with the configured vendor/product id, then
//! picks each interface by usage page and usage.
//!
//! Enumeration and opening are traits so the selection logic can be tested
//! against [`mock`] devices.  The OS backend is chosen at compile time.

pub mod descriptor;
pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

use cgt_core::hid::{HidDeviceSelector, HidError, UsagePair, CONTROL_REPORT_SIZE};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::virtual_hid::ReportWriter;

#[derive(Debug, Error)]
pub enum TransportError {
    /// No HID device carries the configured vendor/product id.
    #[error("no HID device with VID {vendor_id:04x} PID {product_id:04x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// The device exists but lacks the interface with this usage.
    #[error("virtual HID device has no interface with usage page {usage_page:#06x} usage {usage:#06x}")]
    InterfaceNotFound { usage_page: u16, usage: u16 },

    /// An OS call failed; the code is passed through unmodified.
    #[error("HID OS call failed with error {code}")]
    Os { code: i32 },

    #[error("HID I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The OS error code behind this error, or `-1` when there is none.
    pub fn os_code(&self) -> i32 {
        match self {
            TransportError::Os { code } => *code,
            TransportError::Io(e) => e.raw_os_error().unwrap_or(-1),
            _ => -1,
        }
    }
}

/// One enumerated HID interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidDeviceInfo {
    /// OS path used to open the interface.
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Top-level collection of the interface.
    pub usage_page: u16,
    pub usage: u16,
}

impl HidDeviceInfo {
    pub fn usage(&self) -> UsagePair {
        UsagePair {
            usage_page: self.usage_page,
            usage: self.usage,
        }
    }
}

pub trait HidEnumerator {
    fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, TransportError>;
}

pub trait HidOpener {
    fn open(&self, path: &str) -> Result<Box<dyn HidHandle>, TransportError>;
}

/// An open HID interface.  Closed on drop.
pub trait HidHandle: Send {
    fn write_report(&mut self, report: &[u8]) -> Result<(), TransportError>;
    /// Reads one input report into `buf`, returning its length.
    fn read_message(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

pub struct VirtualHidTransport {
    control: Box<dyn HidHandle>,
    message: Box<dyn HidHandle>,
    control_path: String,
    message_path: String,
}

impl VirtualHidTransport {
    /// Opens the control and message interfaces described by `selector`.
    ///
    /// Both failures are fatal for the client: it cannot inject input
    /// without the device.
    pub fn open(
        selector: &HidDeviceSelector,
        enumerator: &dyn HidEnumerator,
        opener: &dyn HidOpener,
    ) -> Result<Self, TransportError> {
        let devices: Vec<HidDeviceInfo> = enumerator
            .enumerate()?
            .into_iter()
            .filter(|d| selector.matches_device(d.vendor_id, d.product_id))
            .collect();
        if devices.is_empty() {
            return Err(TransportError::DeviceNotFound {
                vendor_id: selector.vendor_id,
                product_id: selector.product_id,
            });
        }
        debug!(count = devices.len(), "virtual HID interfaces found");

        let control_path = find_interface(&devices, selector.control)?;
        let message_path = find_interface(&devices, selector.message)?;
        let control = opener.open(&control_path)?;
        let message = opener.open(&message_path)?;

        info!(control = %control_path, message = %message_path, "virtual HID device opened");
        Ok(Self {
            control,
            message,
            control_path,
            message_path,
        })
    }

    pub fn control_path(&self) -> &str {
        &self.control_path
    }

    pub fn message_path(&self) -> &str {
        &self.message_path
    }

    /// Writes one control report.  No retry on failure.
    pub fn write_control(&mut self, report: &[u8]) -> Result<(), TransportError> {
        self.control.write_report(report)
    }

    /// Reads one message from the driver.
    pub fn read_message(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.message.read_message(buf)
    }
}

impl ReportWriter for VirtualHidTransport {
    fn write_report(&mut self, report: &[u8; CONTROL_REPORT_SIZE]) -> Result<(), HidError> {
        self.write_control(report)
            .map_err(|e| HidError::Transport { code: e.os_code() })
    }
}

fn find_interface(devices: &[HidDeviceInfo], wanted: UsagePair) -> Result<String, TransportError> {
    devices
        .iter()
        .find(|d| d.usage() == wanted)
        .map(|d| d.path.clone())
        .ok_or(TransportError::InterfaceNotFound {
            usage_page: wanted.usage_page,
            usage: wanted.usage,
        })
}

/// Enumerator and opener for the platform this binary was built for.
#[cfg(target_os = "linux")]
pub fn platform_backend() -> (linux::HidrawEnumerator, linux::HidrawOpener) {
    (linux::HidrawEnumerator::new(), linux::HidrawOpener)
}

#[cfg(target_os = "windows")]
pub fn platform_backend() -> (windows::SetupApiEnumerator, windows::WindowsHidOpener) {
    (windows::SetupApiEnumerator, windows::WindowsHidOpener)
}

/// No HID backend on this platform: enumeration finds nothing, so opening
/// the transport fails with [`TransportError::DeviceNotFound`].
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub fn platform_backend() -> (mock::MockHidBackend, mock::MockHidBackend) {
    (mock::MockHidBackend::new(), mock::MockHidBackend::new())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
