//! Linux backend over `hidraw`.
//!
//! Each `/sys/class/hidraw/hidrawN/device` directory carries a `uevent`
//! file with `HID_ID=<bus>:<vid>:<pid>` and the raw `report_descriptor`.
//! The interface itself is opened through `/dev/hidrawN`.

#![cfg(target_os = "linux")]

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::descriptor::top_level_usage;
use super::{HidDeviceInfo, HidEnumerator, HidHandle, HidOpener, TransportError};

const SYSFS_HIDRAW: &str = "/sys/class/hidraw";
const DEV_DIR: &str = "/dev";

pub struct HidrawEnumerator {
    sysfs_root: PathBuf,
    dev_dir: PathBuf,
}

impl HidrawEnumerator {
    pub fn new() -> Self {
        Self::with_roots(SYSFS_HIDRAW, DEV_DIR)
    }

    /// Scans `sysfs_root` instead of `/sys/class/hidraw`, reporting device
    /// paths under `dev_dir`.
    pub fn with_roots(sysfs_root: impl Into<PathBuf>, dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
            dev_dir: dev_dir.into(),
        }
    }

    fn describe(&self, node: &str) -> Option<HidDeviceInfo> {
        let device = self.sysfs_root.join(node).join("device");
        let uevent = std::fs::read_to_string(device.join("uevent")).ok()?;
        let (vendor_id, product_id) = parse_hid_id(&uevent)?;
        let descriptor = std::fs::read(device.join("report_descriptor")).ok()?;
        let usage = top_level_usage(&descriptor)?;
        Some(HidDeviceInfo {
            path: self.dev_dir.join(node).to_string_lossy().into_owned(),
            vendor_id,
            product_id,
            usage_page: usage.usage_page,
            usage: usage.usage,
        })
    }
}

impl Default for HidrawEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HidEnumerator for HidrawEnumerator {
    fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, TransportError> {
        let mut devices = Vec::new();
        for entry in std::fs::read_dir(&self.sysfs_root)? {
            let entry = entry?;
            let node = entry.file_name().to_string_lossy().into_owned();
            match self.describe(&node) {
                Some(info) => devices.push(info),
                None => debug!(node = %node, "skipping hidraw node without readable ids"),
            }
        }
        devices.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(devices)
    }
}

/// Parses `HID_ID=0003:00001209:0000C617` out of a `uevent` file.
fn parse_hid_id(uevent: &str) -> Option<(u16, u16)> {
    let value = uevent.lines().find_map(|l| l.strip_prefix("HID_ID="))?;
    let mut parts = value.trim().split(':');
    let _bus = parts.next()?;
    let vendor = u32::from_str_radix(parts.next()?, 16).ok()?;
    let product = u32::from_str_radix(parts.next()?, 16).ok()?;
    Some((vendor as u16, product as u16))
}

pub struct HidrawOpener;

impl HidOpener for HidrawOpener {
    fn open(&self, path: &str) -> Result<Box<dyn HidHandle>, TransportError> {
        let file = OpenOptions::new().read(true).write(true).open(Path::new(path))?;
        Ok(Box::new(HidrawHandle { file }))
    }
}

struct HidrawHandle {
    file: File,
}

impl HidHandle for HidrawHandle {
    fn write_report(&mut self, report: &[u8]) -> Result<(), TransportError> {
        let written = self.file.write(report)?;
        if written != report.len() {
            return Err(TransportError::Os { code: libc::EIO });
        }
        Ok(())
    }

    fn read_message(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(self.file.read(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct FakeSysfs(PathBuf);

    impl FakeSysfs {
        fn new() -> Self {
            let root = std::env::temp_dir().join(format!("cgt-hidraw-{}", Uuid::new_v4()));
            std::fs::create_dir_all(&root).unwrap();
            Self(root)
        }

        fn add(&self, node: &str, hid_id: &str, descriptor: &[u8]) {
            let device = self.0.join(node).join("device");
            std::fs::create_dir_all(&device).unwrap();
            std::fs::write(device.join("uevent"), format!("DRIVER=hid-generic\nHID_ID={hid_id}\n")).unwrap();
            std::fs::write(device.join("report_descriptor"), descriptor).unwrap();
        }
    }

    impl Drop for FakeSysfs {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_parse_hid_id() {
        assert_eq!(parse_hid_id("HID_ID=0003:00001209:0000C617\n"), Some((0x1209, 0xC617)));
        assert_eq!(parse_hid_id("HID_NAME=foo\n"), None);
    }

    #[test]
    fn test_enumerate_reads_ids_and_top_level_usage() {
        // Arrange
        let sysfs = FakeSysfs::new();
        sysfs.add("hidraw1", "0003:00001209:0000C617", &[0x06, 0x00, 0xFF, 0x09, 0x02, 0xA1, 0x01]);
        sysfs.add("hidraw0", "0003:00001209:0000C617", &[0x06, 0x00, 0xFF, 0x09, 0x01, 0xA1, 0x01]);
        std::fs::create_dir_all(sysfs.0.join("hidraw9")).unwrap();
        let enumerator = HidrawEnumerator::with_roots(&sysfs.0, "/dev");

        // Act
        let devices = enumerator.enumerate().unwrap();

        // Assert
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].path, "/dev/hidraw0");
        assert_eq!((devices[0].usage_page, devices[0].usage), (0xFF00, 1));
        assert_eq!((devices[1].usage_page, devices[1].usage), (0xFF00, 2));
        assert_eq!(devices[1].vendor_id, 0x1209);
    }
}
