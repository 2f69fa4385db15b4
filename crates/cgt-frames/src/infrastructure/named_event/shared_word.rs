//! Unix event backend: two words in a small shared file mapping.
//!
//! ```text
//!  0          4            8      12      16
//! ┌──────────┬────────────┬──────┬───────┐
//! │ signaled │ generation │ mode │ magic │
//! └──────────┴────────────┴──────┴───────┘
//! ```
//!
//! `set` stores `signaled = 1`, bumps `generation` and wakes every waiter.
//! A waiter reads `generation` before checking `signaled`, then sleeps on
//! `generation`; a `set` that lands in between changes the word, so the
//! futex wait returns immediately instead of missing the wake-up.
//!
//! Futexes on a `MAP_SHARED` file mapping are keyed by the backing page, so
//! waits and wakes work across processes as long as the private flag is not
//! used.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use memmap2::MmapMut;

use super::EventMode;

const EVENT_FILE_SIZE: u64 = 64;
const EVENT_MAGIC: u32 = u32::from_le_bytes(*b"CGTE");

const SIGNALED: usize = 0;
const GENERATION: usize = 4;
const MODE: usize = 8;
const MAGIC: usize = 12;

// Longest single sleep; longer waits loop and re-check the state.
const MAX_WAIT_SLICE: Duration = Duration::from_secs(1);

const MODE_AUTO: u32 = 1;
const MODE_MANUAL: u32 = 2;

fn event_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.evt"))
}

pub(super) struct EventHandle {
    mmap: MmapMut,
    mode: EventMode,
}

impl EventHandle {
    pub(super) fn create(dir: &Path, name: &str, mode: EventMode) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(event_path(dir, name))?;
        if file.metadata()?.len() != EVENT_FILE_SIZE {
            file.set_len(EVENT_FILE_SIZE)?;
        }
        // SAFETY: read-write file of EVENT_FILE_SIZE bytes; other processes map it too.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        let handle = Self { mmap, mode };

        handle.word(SIGNALED).store(0, Ordering::Release);
        let raw_mode = match mode {
            EventMode::AutoReset => MODE_AUTO,
            EventMode::ManualReset => MODE_MANUAL,
        };
        handle.word(MODE).store(raw_mode, Ordering::Release);
        handle.word(MAGIC).store(EVENT_MAGIC, Ordering::Release);
        Ok(handle)
    }

    pub(super) fn open(dir: &Path, name: &str) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(event_path(dir, name))?;
        if file.metadata()?.len() != EVENT_FILE_SIZE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "event file has the wrong size"));
        }
        // SAFETY: as in `create`.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        let probe = Self {
            mmap,
            mode: EventMode::AutoReset,
        };
        if probe.word(MAGIC).load(Ordering::Acquire) != EVENT_MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "event file is not initialized"));
        }
        let mode = match probe.word(MODE).load(Ordering::Acquire) {
            MODE_MANUAL => EventMode::ManualReset,
            _ => EventMode::AutoReset,
        };
        Ok(Self { mode, ..probe })
    }

    pub(super) fn set(&self) -> io::Result<()> {
        self.word(SIGNALED).store(1, Ordering::Release);
        self.word(GENERATION).fetch_add(1, Ordering::AcqRel);
        wake_all(self.word(GENERATION));
        Ok(())
    }

    pub(super) fn reset(&self) -> io::Result<()> {
        self.word(SIGNALED).store(0, Ordering::Release);
        Ok(())
    }

    pub(super) fn is_set(&self) -> io::Result<bool> {
        Ok(self.word(SIGNALED).load(Ordering::Acquire) == 1)
    }

    /// Waits up to `timeout`.  A timeout too large to express as an
    /// `Instant` (such as `Duration::MAX`) waits without a deadline.
    pub(super) fn wait(&self, timeout: Duration) -> io::Result<bool> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let generation = self.word(GENERATION).load(Ordering::Acquire);
            if self.try_take() {
                return Ok(true);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(false);
                    }
                    (deadline - now).min(MAX_WAIT_SLICE)
                }
                None => MAX_WAIT_SLICE,
            };
            wait_on(self.word(GENERATION), generation, slice);
        }
    }

    fn try_take(&self) -> bool {
        let signaled = self.word(SIGNALED);
        match self.mode {
            EventMode::AutoReset => signaled
                .compare_exchange(1, 0, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
            EventMode::ManualReset => signaled.load(Ordering::Acquire) == 1,
        }
    }

    fn word(&self, offset: usize) -> &AtomicU32 {
        // SAFETY: the mapping is page aligned and EVENT_FILE_SIZE bytes long;
        // every offset used is a multiple of 4 below 16.
        unsafe { &*(self.mmap.as_ptr().add(offset) as *const AtomicU32) }
    }
}

#[cfg(target_os = "linux")]
fn wait_on(word: &AtomicU32, expected: u32, timeout: Duration) {
    let ts = libc::timespec {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_nsec: timeout.subsec_nanos() as libc::c_long,
    };
    // SAFETY: `word` points into a live shared mapping; FUTEX_WAIT only
    // reads it.  EAGAIN, EINTR and ETIMEDOUT all send the caller back to
    // re-check the state, so the return value is not needed.
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT,
            expected,
            &ts as *const libc::timespec,
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}

#[cfg(target_os = "linux")]
fn wake_all(word: &AtomicU32) {
    // SAFETY: as for `wait_on`; FUTEX_WAKE does not touch the word.
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAKE,
            i32::MAX,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}

#[cfg(not(target_os = "linux"))]
fn wait_on(word: &AtomicU32, expected: u32, timeout: Duration) {
    let step = timeout.min(Duration::from_millis(1));
    if word.load(Ordering::Acquire) == expected {
        std::thread::sleep(step);
    }
}

#[cfg(not(target_os = "linux"))]
fn wake_all(_word: &AtomicU32) {}
