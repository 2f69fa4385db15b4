//! In-memory HID backend for tests.
//!
//! `MockHidBackend` is both the enumerator and the opener.  Handles it
//! opens share its state, so a test can inspect every report written to a
//! path and queue messages for the client to read.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use cgt_core::hid::HidDeviceSelector;

use super::{HidDeviceInfo, HidEnumerator, HidHandle, HidOpener, TransportError};

/// Path of the mock virtual device's control interface.
pub const VIRTUAL_CONTROL: &str = "mock://virtual-hid/control";
/// Path of the mock virtual device's message interface.
pub const VIRTUAL_MESSAGE: &str = "mock://virtual-hid/message";

#[derive(Default)]
struct Shared {
    written: HashMap<String, Vec<Vec<u8>>>,
    messages: HashMap<String, VecDeque<Vec<u8>>>,
    fail_writes: Option<i32>,
}

#[derive(Default)]
pub struct MockHidBackend {
    devices: Vec<HidDeviceInfo>,
    shared: Arc<Mutex<Shared>>,
}

impl MockHidBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend holding the virtual device with default selector values,
    /// plus an unrelated keyboard.
    pub fn with_virtual_device() -> Self {
        let sel = HidDeviceSelector::default();
        let mut backend = Self::new();
        backend.add_device(HidDeviceInfo {
            path: "mock://keyboard".into(),
            vendor_id: 0x046D,
            product_id: 0xC31C,
            usage_page: 0x01,
            usage: 0x06,
        });
        backend.add_device(HidDeviceInfo {
            path: VIRTUAL_MESSAGE.into(),
            vendor_id: sel.vendor_id,
            product_id: sel.product_id,
            usage_page: sel.message.usage_page,
            usage: sel.message.usage,
        });
        backend.add_device(HidDeviceInfo {
            path: VIRTUAL_CONTROL.into(),
            vendor_id: sel.vendor_id,
            product_id: sel.product_id,
            usage_page: sel.control.usage_page,
            usage: sel.control.usage,
        });
        backend
    }

    pub fn add_device(&mut self, device: HidDeviceInfo) {
        self.devices.push(device);
    }

    /// Every report written to `path`, oldest first.
    pub fn written(&self, path: &str) -> Vec<Vec<u8>> {
        self.lock().written.get(path).cloned().unwrap_or_default()
    }

    /// Makes every subsequent write fail with OS error `code` (or succeed again with `None`).
    pub fn fail_writes(&self, code: Option<i32>) {
        self.lock().fail_writes = code;
    }

    pub fn queue_message(&self, path: &str, message: &[u8]) {
        self.lock()
            .messages
            .entry(path.to_string())
            .or_default()
            .push_back(message.to_vec());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        lock(&self.shared)
    }
}

impl HidEnumerator for MockHidBackend {
    fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, TransportError> {
        Ok(self.devices.clone())
    }
}

impl HidOpener for MockHidBackend {
    fn open(&self, path: &str) -> Result<Box<dyn HidHandle>, TransportError> {
        if !self.devices.iter().any(|d| d.path == path) {
            return Err(TransportError::Os { code: 2 });
        }
        Ok(Box::new(MockHidHandle {
            path: path.to_string(),
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct MockHidHandle {
    path: String,
    shared: Arc<Mutex<Shared>>,
}

impl HidHandle for MockHidHandle {
    fn write_report(&mut self, report: &[u8]) -> Result<(), TransportError> {
        let mut shared = lock(&self.shared);
        if let Some(code) = shared.fail_writes {
            return Err(TransportError::Os { code });
        }
        shared
            .written
            .entry(self.path.clone())
            .or_default()
            .push(report.to_vec());
        Ok(())
    }

    fn read_message(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut shared = lock(&self.shared);
        let message = shared
            .messages
            .get_mut(&self.path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();
        let n = message.len().min(buf.len());
        buf[..n].copy_from_slice(&message[..n]);
        Ok(n)
    }
}

// A poisoned lock only means another test thread panicked mid-record.
fn lock(shared: &Mutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
