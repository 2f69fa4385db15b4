//! Interface to the process injector that loads the capture library into a
//! target process.
//!
//! The injector itself lives outside this workspace.  This module only fixes
//! the request shape and the result so that launchers can be written and
//! tested against a trait.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which process to inject into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionTarget {
    /// An already running process, matched by executable image name.
    ImageName(String),
    /// A process the injector starts itself.
    Launch {
        path: PathBuf,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        working_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMode {
    Immediate,
    /// Start the target, wait `delay`, then inject.
    LaunchThenInject {
        #[serde(with = "millis")]
        delay: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionRequest {
    pub target: InjectionTarget,
    #[serde(default)]
    pub library_x86: Option<PathBuf>,
    #[serde(default)]
    pub library_x64: Option<PathBuf>,
    pub mode: InjectionMode,
}

impl InjectionRequest {
    /// Checks the request before it is handed to an injector.
    pub fn validate(&self) -> Result<(), InjectionError> {
        if self.library_x86.is_none() && self.library_x64.is_none() {
            return Err(InjectionError::InvalidRequest("no library to inject"));
        }
        if let InjectionTarget::ImageName(name) = &self.target {
            if name.trim().is_empty() {
                return Err(InjectionError::InvalidRequest("empty image name"));
            }
            if matches!(self.mode, InjectionMode::LaunchThenInject { .. }) {
                return Err(InjectionError::InvalidRequest(
                    "launch-then-inject needs a launch target",
                ));
            }
        }
        Ok(())
    }
}

/// Result of a successful injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionOutcome {
    pub pid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    #[error("invalid injection request: {0}")]
    InvalidRequest(&'static str),

    /// The injector failed; `native_code` is its status code, unmodified.
    #[error("injection failed with native status {native_code}")]
    Failed { native_code: i32 },
}

pub trait ProcessInjector {
    fn inject(&self, request: &InjectionRequest) -> Result<InjectionOutcome, InjectionError>;
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn launch_request() -> InjectionRequest {
        InjectionRequest {
            target: InjectionTarget::Launch {
                path: PathBuf::from("game.exe"),
                args: vec!["-windowed".to_string()],
                working_dir: None,
            },
            library_x86: None,
            library_x64: Some(PathBuf::from("capture64.dll")),
            mode: InjectionMode::LaunchThenInject {
                delay: Duration::from_millis(500),
            },
        }
    }

    /// Records the requests it receives and answers with a fixed result.
    struct RecordingInjector {
        seen: RefCell<Vec<InjectionRequest>>,
        result: Result<InjectionOutcome, InjectionError>,
    }

    impl ProcessInjector for RecordingInjector {
        fn inject(&self, request: &InjectionRequest) -> Result<InjectionOutcome, InjectionError> {
            request.validate()?;
            self.seen.borrow_mut().push(request.clone());
            self.result.clone()
        }
    }

    #[test]
    fn test_launch_request_is_valid() {
        assert!(launch_request().validate().is_ok());
    }

    #[test]
    fn test_request_without_library_is_rejected() {
        let mut request = launch_request();
        request.library_x64 = None;
        assert_eq!(
            request.validate(),
            Err(InjectionError::InvalidRequest("no library to inject"))
        );
    }

    #[test]
    fn test_delayed_mode_requires_launch_target() {
        let mut request = launch_request();
        request.target = InjectionTarget::ImageName("game.exe".to_string());
        assert!(request.validate().is_err());

        request.mode = InjectionMode::Immediate;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_injector_reports_pid_and_native_failures() {
        // Arrange
        let ok = RecordingInjector {
            seen: RefCell::new(Vec::new()),
            result: Ok(InjectionOutcome { pid: 4321 }),
        };
        let failing = RecordingInjector {
            seen: RefCell::new(Vec::new()),
            result: Err(InjectionError::Failed { native_code: 5 }),
        };

        // Act / Assert
        assert_eq!(ok.inject(&launch_request()), Ok(InjectionOutcome { pid: 4321 }));
        assert_eq!(ok.seen.borrow().len(), 1);
        assert_eq!(
            failing.inject(&launch_request()),
            Err(InjectionError::Failed { native_code: 5 })
        );
    }

    #[test]
    fn test_request_deserializes_from_toml() {
        let toml_str = r#"
library_x86 = "capture32.dll"
mode = "immediate"

[target]
image_name = "game.exe"
"#;
        let request: InjectionRequest = toml::from_str(toml_str).expect("deserialize");
        assert_eq!(request.target, InjectionTarget::ImageName("game.exe".to_string()));
        assert_eq!(request.mode, InjectionMode::Immediate);
        assert!(request.validate().is_ok());
    }
}
