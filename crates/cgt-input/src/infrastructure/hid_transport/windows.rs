//! Windows backend over SetupAPI and `hid.dll`.
//!
//! Enumerates the HID device interface class, opens each interface for
//! attribute queries only, and reads VID/PID with `HidD_GetAttributes` and
//! the top-level usage with `HidP_GetCaps`.

#![cfg(target_os = "windows")]

use windows::core::{Error as WinError, GUID, PCWSTR};
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInterfaces, SetupDiGetClassDevsW,
    SetupDiGetDeviceInterfaceDetailW, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT, HDEVINFO, SP_DEVICE_INTERFACE_DATA,
    SP_DEVICE_INTERFACE_DETAIL_DATA_W,
};
use windows::Win32::Devices::HumanInterfaceDevice::{
    HidD_FreePreparsedData, HidD_GetAttributes, HidD_GetHidGuid, HidD_GetPreparsedData, HidP_GetCaps,
    HIDD_ATTRIBUTES, HIDP_CAPS, HIDP_STATUS_SUCCESS, PHIDP_PREPARSED_DATA,
};
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, ReadFile, WriteFile, FILE_FLAGS_AND_ATTRIBUTES, FILE_GENERIC_READ, FILE_GENERIC_WRITE,
    FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};

use tracing::debug;

use super::{HidDeviceInfo, HidEnumerator, HidHandle, HidOpener, TransportError};

/// Windows error code carried by a `windows::core::Error`.
///
/// HRESULTs built from Win32 errors (facility 7) are unwrapped back to the
/// Win32 code; anything else is passed as the raw HRESULT.
fn os_error(e: WinError) -> TransportError {
    let hr = e.code().0 as u32;
    let code = if hr & 0xFFFF_0000 == 0x8007_0000 {
        (hr & 0xFFFF) as i32
    } else {
        hr as i32
    };
    TransportError::Os { code }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Closes the device information set on drop.
struct DevInfoList(HDEVINFO);

impl Drop for DevInfoList {
    fn drop(&mut self) {
        // SAFETY: the set was returned by SetupDiGetClassDevsW and is destroyed once.
        let _ = unsafe { SetupDiDestroyDeviceInfoList(self.0) };
    }
}

/// Closes a file handle on drop.
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateFileW and is closed once.
        let _ = unsafe { CloseHandle(self.0) };
    }
}

fn open_path(path: &str, access: u32) -> Result<OwnedHandle, TransportError> {
    let wide_path = wide(path);
    // SAFETY: `wide_path` is NUL-terminated and outlives the call.
    let handle = unsafe {
        CreateFileW(
            PCWSTR(wide_path.as_ptr()),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            None,
            OPEN_EXISTING,
            FILE_FLAGS_AND_ATTRIBUTES(0),
            HANDLE::default(),
        )
    }
    .map_err(os_error)?;
    Ok(OwnedHandle(handle))
}

pub struct SetupApiEnumerator;

impl SetupApiEnumerator {
    fn interface_path(list: &DevInfoList, iface: &SP_DEVICE_INTERFACE_DATA) -> Option<String> {
        let mut required = 0u32;
        // SAFETY: size query with no output buffer; fails with
        // ERROR_INSUFFICIENT_BUFFER and fills `required`.
        let _ = unsafe { SetupDiGetDeviceInterfaceDetailW(list.0, iface, None, 0, Some(&mut required as *mut u32), None) };
        if (required as usize) < std::mem::size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() {
            return None;
        }

        // u64 storage keeps the struct aligned.
        let mut storage = vec![0u64; (required as usize).div_ceil(8)];
        let detail = storage.as_mut_ptr().cast::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>();
        // SAFETY: `storage` holds at least `required` bytes, aligned for the struct.
        unsafe {
            (*detail).cbSize = std::mem::size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32;
            SetupDiGetDeviceInterfaceDetailW(list.0, iface, Some(detail), required, None, None).ok()?;
        }

        // SAFETY: DevicePath is a NUL-terminated UTF-16 string inside `storage`.
        let path = unsafe {
            let start = std::ptr::addr_of!((*detail).DevicePath).cast::<u16>();
            let max = (required as usize - std::mem::size_of::<u32>()) / 2;
            let len = (0..max).take_while(|&i| *start.add(i) != 0).count();
            String::from_utf16_lossy(std::slice::from_raw_parts(start, len))
        };
        Some(path)
    }

    fn query(path: &str) -> Result<HidDeviceInfo, TransportError> {
        let handle = open_path(path, 0)?;

        let mut attributes = HIDD_ATTRIBUTES {
            Size: std::mem::size_of::<HIDD_ATTRIBUTES>() as u32,
            ..Default::default()
        };
        // SAFETY: valid handle and out-pointer.
        if !unsafe { HidD_GetAttributes(handle.0, &mut attributes) }.as_bool() {
            return Err(os_error(WinError::from_win32()));
        }

        let mut preparsed = PHIDP_PREPARSED_DATA::default();
        // SAFETY: valid handle and out-pointer; freed below.
        if !unsafe { HidD_GetPreparsedData(handle.0, &mut preparsed) }.as_bool() {
            return Err(os_error(WinError::from_win32()));
        }
        let mut caps = HIDP_CAPS::default();
        // SAFETY: `preparsed` was returned by HidD_GetPreparsedData above.
        let status = unsafe { HidP_GetCaps(preparsed, &mut caps) };
        // SAFETY: released exactly once.
        let _ = unsafe { HidD_FreePreparsedData(preparsed) };
        if status != HIDP_STATUS_SUCCESS {
            return Err(TransportError::Os { code: status.0 });
        }

        Ok(HidDeviceInfo {
            path: path.to_string(),
            vendor_id: attributes.VendorID,
            product_id: attributes.ProductID,
            usage_page: caps.UsagePage,
            usage: caps.Usage,
        })
    }
}

impl HidEnumerator for SetupApiEnumerator {
    fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, TransportError> {
        // SAFETY: plain value return.
        let guid = unsafe { HidD_GetHidGuid() };
        // SAFETY: `guid` outlives the call; the set is owned by `list`.
        let set = unsafe {
            SetupDiGetClassDevsW(
                Some(&guid as *const GUID),
                PCWSTR::null(),
                HWND::default(),
                DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
            )
        }
        .map_err(os_error)?;
        let list = DevInfoList(set);

        let mut devices = Vec::new();
        for index in 0.. {
            let mut iface = SP_DEVICE_INTERFACE_DATA {
                cbSize: std::mem::size_of::<SP_DEVICE_INTERFACE_DATA>() as u32,
                ..Default::default()
            };
            // SAFETY: `iface.cbSize` is set; enumeration ends with an error.
            if unsafe { SetupDiEnumDeviceInterfaces(list.0, None, &guid, index, &mut iface) }.is_err() {
                break;
            }
            let Some(path) = Self::interface_path(&list, &iface) else {
                continue;
            };
            match Self::query(&path) {
                Ok(info) => devices.push(info),
                Err(e) => debug!(path = %path, "skipping HID interface: {e}"),
            }
        }
        Ok(devices)
    }
}

pub struct WindowsHidOpener;

impl HidOpener for WindowsHidOpener {
    fn open(&self, path: &str) -> Result<Box<dyn HidHandle>, TransportError> {
        let handle = open_path(path, FILE_GENERIC_READ.0 | FILE_GENERIC_WRITE.0)?;
        Ok(Box::new(WindowsHidHandle { handle }))
    }
}

struct WindowsHidHandle {
    handle: OwnedHandle,
}

// SAFETY: a file handle may be used from any thread.
unsafe impl Send for WindowsHidHandle {}

impl HidHandle for WindowsHidHandle {
    fn write_report(&mut self, report: &[u8]) -> Result<(), TransportError> {
        let mut written = 0u32;
        // SAFETY: synchronous write from a live buffer.
        unsafe { WriteFile(self.handle.0, Some(report), Some(&mut written as *mut u32), None) }.map_err(os_error)?;
        if written as usize != report.len() {
            return Err(TransportError::Os { code: 0x1F });
        }
        Ok(())
    }

    fn read_message(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut read = 0u32;
        // SAFETY: synchronous read into a live buffer.
        unsafe { ReadFile(self.handle.0, Some(buf), Some(&mut read as *mut u32), None) }.map_err(os_error)?;
        Ok(read as usize)
    }
}
