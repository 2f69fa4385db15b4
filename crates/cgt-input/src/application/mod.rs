//! Application layer of the input client.
//!
//! - **`virtual_hid`** – The keyboard/mouse state machine.  Every change is
//!   serialized into a control report and handed to a [`virtual_hid::ReportWriter`],
//!   which the infrastructure layer implements on top of the HID device.
//! - **`command`** – Text commands (`press 0x41`, `move 10 20`, ...) and how
//!   each one drives the client.

pub mod command;
pub mod virtual_hid;

pub use command::{Command, CommandError};
pub use virtual_hid::{AbsolutePointer, RelativePointer, ReportWriter, VirtualHidClient};
