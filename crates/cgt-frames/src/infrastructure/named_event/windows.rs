//! Windows event backend: kernel event objects in the session namespace.

use std::io;
use std::path::Path;
use std::time::Duration;

use windows::core::HSTRING;
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_ABANDONED, WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::System::Threading::{
    CreateEventW, OpenEventW, ResetEvent, SetEvent, WaitForSingleObject, EVENT_MODIFY_STATE, INFINITE,
    SYNCHRONIZATION_SYNCHRONIZE,
};

use super::EventMode;

fn object_name(name: &str) -> HSTRING {
    HSTRING::from(format!("Local\\{name}"))
}

fn to_io(err: windows::core::Error) -> io::Error {
    // HRESULT_FROM_WIN32 keeps the Win32 code in the low 16 bits.
    io::Error::from_raw_os_error(err.code().0 & 0xFFFF)
}

pub(super) struct EventHandle {
    handle: HANDLE,
}

// SAFETY: event handles may be used from any thread.
unsafe impl Send for EventHandle {}
unsafe impl Sync for EventHandle {}

impl EventHandle {
    pub(super) fn create(_dir: &Path, name: &str, mode: EventMode) -> io::Result<Self> {
        let manual = matches!(mode, EventMode::ManualReset);
        // SAFETY: plain Win32 call; the name outlives the call.
        let handle = unsafe { CreateEventW(None, manual, false, &object_name(name)) }.map_err(to_io)?;
        let event = Self { handle };
        // CreateEventW returns the existing object when the name is taken.
        event.reset()?;
        Ok(event)
    }

    pub(super) fn open(_dir: &Path, name: &str) -> io::Result<Self> {
        // SAFETY: as above.
        let handle = unsafe {
            OpenEventW(
                EVENT_MODIFY_STATE | SYNCHRONIZATION_SYNCHRONIZE,
                false,
                &object_name(name),
            )
        }
        .map_err(to_io)?;
        Ok(Self { handle })
    }

    pub(super) fn set(&self) -> io::Result<()> {
        // SAFETY: `self.handle` is a live event handle.
        unsafe { SetEvent(self.handle) }.map_err(to_io)
    }

    pub(super) fn reset(&self) -> io::Result<()> {
        // SAFETY: as above.
        unsafe { ResetEvent(self.handle) }.map_err(to_io)
    }

    pub(super) fn is_set(&self) -> io::Result<bool> {
        self.wait(Duration::ZERO)
    }

    pub(super) fn wait(&self, timeout: Duration) -> io::Result<bool> {
        // Anything at or beyond u32::MAX ms becomes INFINITE.
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(INFINITE);
        // SAFETY: as above.
        let result = unsafe { WaitForSingleObject(self.handle, millis) };
        match result {
            WAIT_OBJECT_0 | WAIT_ABANDONED => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            WAIT_FAILED => Err(io::Error::last_os_error()),
            other => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("unexpected wait result {:#x}", other.0),
            )),
        }
    }
}

impl Drop for EventHandle {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by CreateEventW/OpenEventW and is
        // closed exactly once.
        let _ = unsafe { CloseHandle(self.handle) };
    }
}
