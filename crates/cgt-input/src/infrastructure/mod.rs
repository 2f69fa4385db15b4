//! Infrastructure layer for the input client.
//!
//! **Dependency rule**: this layer may depend on `application` and `cgt_core`,
//! but MUST NOT be imported by the `application` layer.
//!
//! - **`hid_transport`** – Finds the virtual HID device and implements
//!   [`crate::application::ReportWriter`] on its control interface.  The OS
//!   backend (`hidraw` on Linux, SetupAPI on Windows) is chosen with
//!   `#[cfg(target_os)]`; an in-memory mock serves the tests.
//! - **`storage`** – TOML configuration.

pub mod hid_transport;
pub mod storage;
