//! Producer and consumer halves of the frame exchange.
//!
//! - **`producer`** – runs inside the captured process.  Rotates through the
//!   region's slots, writes each frame, then signals `frame-ready`.
//! - **`consumer`** – runs in the streaming process.  Waits on `frame-ready`
//!   and borrows the latest slot without copying it.
//! - **`payload`** – per-kind payloads and their metadata layout.
//! - **`stats`** – turns cumulative [`cgt_core::layout::FrameStats`] into
//!   per-interval figures.

pub mod consumer;
pub mod payload;
pub mod producer;
pub mod stats;

pub use consumer::{FrameConsumer, FrameView};
pub use payload::{FramePayload, FramePayloadView};
pub use producer::{FrameProducer, SlotAcquire, SlotHandle};
pub use stats::{StatsSample, StatsTracker};
