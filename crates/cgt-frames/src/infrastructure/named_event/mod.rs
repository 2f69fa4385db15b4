//! Cross-process named events.
//!
//! # Platform support
//!
//! | Platform      | Backend                                                    |
//! |---------------|------------------------------------------------------------|
//! | Windows       | `CreateEventW` / `OpenEventW` kernel events                |
//! | Linux         | shared file mapping + futex wait/wake                      |
//! | Other Unix    | shared file mapping + short sleeps                         |
//!
//! An auto-reset event releases one waiter per `set` and clears itself; a
//! manual-reset event stays set until `reset`.  Signals are not queued: two
//! `set` calls with no waiter in between leave a single pending signal.
//!
//! The handle is closed when the [`NamedEvent`] is dropped.  The event
//! itself lives as long as the OS keeps it alive (Windows) or until its
//! backing file is removed (Unix).

use std::path::Path;
use std::time::Duration;

use crate::error::FrameError;

#[cfg(unix)]
mod shared_word;
#[cfg(unix)]
use shared_word as imp;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as imp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    AutoReset,
    ManualReset,
}

pub struct NamedEvent {
    name: String,
    inner: imp::EventHandle,
}

impl NamedEvent {
    /// Creates the event in the non-signaled state, or takes over an
    /// existing one with the same name and clears it.
    pub fn create(dir: &Path, name: &str, mode: EventMode) -> Result<Self, FrameError> {
        let inner = imp::EventHandle::create(dir, name, mode).map_err(|e| FrameError::named(name, e))?;
        Ok(Self {
            name: name.to_string(),
            inner,
        })
    }

    /// Opens an event created by another process.
    pub fn open(dir: &Path, name: &str) -> Result<Self, FrameError> {
        let inner = imp::EventHandle::open(dir, name).map_err(|e| FrameError::named(name, e))?;
        Ok(Self {
            name: name.to_string(),
            inner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&self) -> Result<(), FrameError> {
        self.inner.set().map_err(|e| self.failed(e))
    }

    pub fn reset(&self) -> Result<(), FrameError> {
        self.inner.reset().map_err(|e| self.failed(e))
    }

    /// Waits up to `timeout` for the event.  Returns `false` on timeout.
    ///
    /// For an auto-reset event a successful wait consumes the signal.
    pub fn wait(&self, timeout: Duration) -> Result<bool, FrameError> {
        self.inner.wait(timeout).map_err(|e| self.failed(e))
    }

    /// Whether the event is currently signaled.
    ///
    /// Meant for manual-reset events.  On Windows, checking an auto-reset
    /// event this way consumes its signal.
    pub fn is_set(&self) -> Result<bool, FrameError> {
        self.inner.is_set().map_err(|e| self.failed(e))
    }

    fn failed(&self, source: std::io::Error) -> FrameError {
        FrameError::Event {
            name: self.name.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for NamedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedEvent").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_dir::TestDir;
    use std::time::Instant;

    #[test]
    fn test_open_missing_event_fails() {
        let dir = TestDir::new();
        assert!(matches!(
            NamedEvent::open(dir.path(), "cgt_test_missing_event"),
            Err(FrameError::NamedObject { .. })
        ));
    }

    #[test]
    fn test_unsignaled_wait_times_out() {
        let dir = TestDir::new();
        let event = NamedEvent::create(dir.path(), "cgt_test_timeout", EventMode::AutoReset).unwrap();
        let start = Instant::now();

        let signaled = event.wait(Duration::from_millis(20)).unwrap();

        assert!(!signaled);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_auto_reset_releases_one_wait_per_set() {
        // Arrange
        let dir = TestDir::new();
        let producer = NamedEvent::create(dir.path(), "cgt_test_auto", EventMode::AutoReset).unwrap();
        let consumer = NamedEvent::open(dir.path(), "cgt_test_auto").unwrap();

        // Act
        producer.set().unwrap();
        producer.set().unwrap();
        let first = consumer.wait(Duration::from_millis(10)).unwrap();
        let second = consumer.wait(Duration::from_millis(10)).unwrap();

        // Assert
        assert!(first);
        assert!(!second, "signals are not queued");
    }

    #[test]
    fn test_manual_reset_stays_set_until_reset() {
        let dir = TestDir::new();
        let event = NamedEvent::create(dir.path(), "cgt_test_manual", EventMode::ManualReset).unwrap();
        let other = NamedEvent::open(dir.path(), "cgt_test_manual").unwrap();

        event.set().unwrap();
        assert!(other.wait(Duration::ZERO).unwrap());
        assert!(other.wait(Duration::ZERO).unwrap());
        assert!(other.is_set().unwrap());

        event.reset().unwrap();
        assert!(!other.is_set().unwrap());
    }

    #[test]
    fn test_set_wakes_a_blocked_waiter() {
        let dir = TestDir::new();
        let event = NamedEvent::create(dir.path(), "cgt_test_wake", EventMode::AutoReset).unwrap();
        let waiter = {
            let path = dir.path().to_path_buf();
            std::thread::spawn(move || {
                let opened = NamedEvent::open(&path, "cgt_test_wake").unwrap();
                opened.wait(Duration::from_secs(5)).unwrap()
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        event.set().unwrap();

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_unbounded_wait_returns_when_set() {
        // Arrange
        let dir = TestDir::new();
        let event = NamedEvent::create(dir.path(), "cgt_test_forever", EventMode::AutoReset).unwrap();
        let waiter = {
            let path = dir.path().to_path_buf();
            std::thread::spawn(move || {
                let opened = NamedEvent::open(&path, "cgt_test_forever").unwrap();
                opened.wait(Duration::MAX).unwrap()
            })
        };

        // Act
        std::thread::sleep(Duration::from_millis(20));
        event.set().unwrap();

        // Assert
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_unbounded_wait_on_signaled_event_returns_at_once() {
        let dir = TestDir::new();
        let event = NamedEvent::create(dir.path(), "cgt_test_forever_set", EventMode::ManualReset).unwrap();
        event.set().unwrap();

        assert!(event.wait(Duration::MAX).unwrap());
    }
}
