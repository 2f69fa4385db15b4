//! # cgt-core
//!
//! Shared library for CG-Transport, the layer that moves captured frames out
//! of a game process and moves remote input into a virtual HID device.
//!
//! This crate holds everything both sides must agree on.  It makes no OS
//! calls beyond reading environment variables.  The shared-memory plumbing
//! lives in `cgt-frames` and the HID device plumbing in `cgt-input`.
//!
//! # Architecture overview
//!
//! ```text
//!  captured process                         streaming process
//!  ────────────────                         ─────────────────
//!  FrameProducer ──slot write──▶ shared region ──slot read──▶ FrameConsumer
//!        └────────signal──────▶ frame-ready event ──wait────────┘
//!
//!  remote input ─▶ KeyboardState / MouseState ─▶ ControlReport ─▶ virtual HID driver
//! ```
//!
//! - **`layout`** – The names of every shared mapping and event, and the
//!   fixed-size records stored in them, with explicit little-endian codecs.
//!
//! - **`frame`** – The slot ring that keeps texture frames strictly
//!   alternating between two slots, and the per-media stream lifecycle.
//!
//! - **`hid`** – Keyboard and mouse state machines and the report formats
//!   the virtual HID driver consumes.
//!
//! - **`keymap`** – Translation from host virtual-key codes to USB HID
//!   Usage IDs.
//!
//! - **`injector`** – The request/result contract of the external process
//!   injector.
//!
//! - **`paths`** – Where the binaries look for their configuration files.

pub mod frame;
pub mod hid;
pub mod injector;
pub mod keymap;
pub mod layout;
pub mod paths;

pub use frame::{SlotIndex, SlotRing, StreamSignal, StreamState};
pub use hid::{HidDeviceSelector, HidError, KeyboardState, MouseButton, MouseState};
pub use keymap::{HidKeyCode, KeyMapper};
pub use layout::{ChannelNames, FrameSlotHeader, FrameStats, LayoutError, MediaKind};
