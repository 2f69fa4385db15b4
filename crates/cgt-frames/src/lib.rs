//! cgt-frames library entry point.
//!
//! Moves captured frames from a producer (the captured process) to a
//! consumer (the streaming process) through a named shared-memory region,
//! signalling with named events.  `tests/` and the `cgt-frame-monitor`
//! binary share this module tree.
//!
//! # How a frame travels
//!
//! ```text
//! producer                               consumer
//!  acquire_slot()  ── waits ≤ 2 ms for read_seq ──┐
//!  publish()                                       │
//!    write metadata + bytes                        │
//!    publish_seq (Release)                         │
//!    set frame-ready ─────────────────────────▶ wait_and_read()
//!                                                 latest_slot (Acquire)
//!                                                 FrameView (borrowed)
//!                          read_seq ◀──────────── drop(FrameView)
//! ```
//!
//! There are no locks inside the region.  Texture frames alternate between
//! two slots so the producer writes one while the consumer reads the other;
//! audio and YUV frames share a single rolling slot.

/// Application layer: producer, consumer, payloads and statistics.
pub mod application;

/// Error type shared by both halves.
pub mod error;

/// Infrastructure layer: mapped regions, named events and configuration.
pub mod infrastructure;

pub use application::{FrameConsumer, FramePayload, FramePayloadView, FrameProducer, FrameView, SlotAcquire};
pub use error::FrameError;
pub use infrastructure::storage::config::{load_config, FramesConfig, ShmConfig};
