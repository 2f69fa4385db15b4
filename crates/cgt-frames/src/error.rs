//! Error type for the frame transport.

use std::path::PathBuf;

use cgt_core::frame::{SlotIndex, StateError};
use cgt_core::layout::LayoutError;
use cgt_core::MediaKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    /// A named mapping or event does not exist or cannot be accessed.
    ///
    /// Fatal at startup; the transport never retries it internally.
    #[error("cannot open shared object {name}: {source}")]
    NamedObject {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The mapping exists but its header or size disagrees with this build.
    #[error("shared region {path} does not match the expected layout: {reason}")]
    LayoutMismatch { path: PathBuf, reason: String },

    /// The payload does not fit into the slot.
    #[error("payload of {size} bytes exceeds slot capacity of {capacity} bytes")]
    PayloadTooLarge { size: u64, capacity: u64 },

    /// The payload kind does not belong on this channel.
    #[error("{payload} payload cannot be published on the {channel:?} channel")]
    KindMismatch { channel: MediaKind, payload: &'static str },

    /// The audio plane sizes disagree with the number of sample bytes.
    #[error("audio frame declares {declared} sample bytes but {actual} were supplied")]
    PayloadSizeMismatch { declared: u64, actual: u64 },

    /// The slot handle does not match the slot the ring expects next.
    #[error("{slot} is not the next slot in the ring (expected {expected})")]
    StaleSlot { slot: SlotIndex, expected: SlotIndex },

    /// A named event operation failed after it was opened.
    #[error("event {name} failed: {source}")]
    Event {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("shared memory I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub(crate) fn named(name: impl Into<String>, source: std::io::Error) -> Self {
        FrameError::NamedObject {
            name: name.into(),
            source,
        }
    }
}
