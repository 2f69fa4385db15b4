//! cgt-input library entry point.
//!
//! Drives the CG-Transport virtual HID device: a keyboard, an absolute
//! pointer and a relative pointer, all fed through one vendor-defined
//! control interface.  The library exposes the client state machine and the
//! device transport so the `cgt-input` binary and `tests/` share them.
//!
//! ```text
//! Command::parse ─▶ VirtualHidClient ─▶ ControlReport::wrap ─▶ VirtualHidTransport
//!                   (keyboard + mouse      (64-byte report)      (control interface)
//!                    state)
//! ```

/// Application layer: client state machine and text commands.
pub mod application;

/// Infrastructure layer: HID device transport and configuration.
pub mod infrastructure;

pub use application::{Command, CommandError, ReportWriter, VirtualHidClient};
pub use infrastructure::hid_transport::{TransportError, VirtualHidTransport};
pub use infrastructure::storage::config::{load_config, InputConfig};
