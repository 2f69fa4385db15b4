//! Shared layout registry: well-known object names and the fixed-size records
//! stored in the shared frame regions.
//!
//! Nothing here touches the OS.  `cgt-frames` places these records into
//! memory-mapped regions; this module only knows how to turn them into bytes
//! and back.

mod codec;
pub mod frame;
pub mod names;

use thiserror::Error;

pub use frame::{
    AudioFrameHeader, FrameKind, FrameSlotHeader, FrameStats, FrameStatsDelta, PackedAudioFrameHeader,
    TextureFramePayload, AUDIO_CODEC_NAME_LEN, AUDIO_MAX_PLANES,
};
pub use names::{texture_handle_name, ChannelNames, ChannelSet, MediaKind};

/// Errors produced while decoding or validating shared records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The buffer is shorter than the record it should contain.
    #[error("insufficient data for {context}: need {needed} bytes, got {available}")]
    InsufficientData {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// A field holds a value outside its enumerated range.
    #[error("invalid value {value} for field {field}")]
    InvalidValue { field: &'static str, value: u64 },

    /// A frame with content must have non-zero width and height.
    #[error("frame has content but empty dimensions {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
}
