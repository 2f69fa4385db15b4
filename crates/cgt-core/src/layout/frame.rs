//! Fixed-size records stored inside the shared frame regions.
//!
//! Each record has a `SIZE` constant and an explicit little-endian codec.
//! `encode_into` and `decode` both check the buffer length first, so a
//! truncated or corrupted region surfaces as [`LayoutError`] rather than a
//! panic in the consumer.
//!
//! ```text
//! FrameSlotHeader (32)      FrameStats (72)
//! ┌───────────────┐         ┌──────────────────────────┐
//! │ timestamp  u64│         │ timestamp            u64 │
//! │ frame_kind u32│         │ preprocess_us        u64 │
//! │ width      u32│         │ hardware_encode_us   u64 │
//! │ height     u32│         │ wait_for_buffer_us   u64 │
//! │ pixel_fmt  u32│         │ buffer_map_us        u64 │
//! │ window     u64│         │ colorspace_convert_us u64│
//! └───────────────┘         │ total_us             u64 │
//!                           │ acquire_attempts     u64 │
//!                           │ acquire_successes    u64 │
//!                           └──────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use super::codec::{read_u32, read_u64, require_len, write_u32, write_u64};
use super::LayoutError;

/// What the current video frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum FrameKind {
    #[default]
    None = 0,
    Yuv = 1,
    Texture = 2,
}

impl TryFrom<u32> for FrameKind {
    type Error = LayoutError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FrameKind::None),
            1 => Ok(FrameKind::Yuv),
            2 => Ok(FrameKind::Texture),
            other => Err(LayoutError::InvalidValue {
                field: "frame_kind",
                value: u64::from(other),
            }),
        }
    }
}

/// Describes the video frame most recently published (the video-info mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSlotHeader {
    /// Monotonic capture time in microseconds.
    pub timestamp: u64,
    pub frame_kind: FrameKind,
    pub width: u32,
    pub height: u32,
    /// Opaque pixel format identifier, interpreted by the encoder.
    pub pixel_format: u32,
    /// Opaque identity of the captured host window.
    pub window_handle: u64,
}

impl FrameSlotHeader {
    pub const SIZE: usize = 32;

    /// Checks that a frame with content has non-zero dimensions.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.frame_kind != FrameKind::None && (self.width == 0 || self.height == 0) {
            return Err(LayoutError::EmptyDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), LayoutError> {
        require_len(buf, Self::SIZE, "FrameSlotHeader")?;
        write_u64(buf, 0, self.timestamp);
        write_u32(buf, 8, self.frame_kind as u32);
        write_u32(buf, 12, self.width);
        write_u32(buf, 16, self.height);
        write_u32(buf, 20, self.pixel_format);
        write_u64(buf, 24, self.window_handle);
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> Result<Self, LayoutError> {
        require_len(buf, Self::SIZE, "FrameSlotHeader")?;
        Ok(Self {
            timestamp: read_u64(buf, 0),
            frame_kind: FrameKind::try_from(read_u32(buf, 8))?,
            width: read_u32(buf, 12),
            height: read_u32(buf, 16),
            pixel_format: read_u32(buf, 20),
            window_handle: read_u64(buf, 24),
        })
    }
}

/// Per-frame capture pipeline statistics.
///
/// Every field except `timestamp` is a running total over the lifetime of the
/// shared region.  Consumers compare two snapshots with
/// [`FrameStats::delta_since`] instead of reading absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameStats {
    pub timestamp: u64,
    pub preprocess_us: u64,
    pub hardware_encode_us: u64,
    pub wait_for_buffer_us: u64,
    pub buffer_map_us: u64,
    pub colorspace_convert_us: u64,
    pub total_us: u64,
    pub acquire_attempts: u64,
    pub acquire_successes: u64,
}

impl FrameStats {
    pub const SIZE: usize = 72;

    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), LayoutError> {
        require_len(buf, Self::SIZE, "FrameStats")?;
        let fields = self.fields();
        for (i, value) in fields.iter().enumerate() {
            write_u64(buf, i * 8, *value);
        }
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> Result<Self, LayoutError> {
        require_len(buf, Self::SIZE, "FrameStats")?;
        Ok(Self {
            timestamp: read_u64(buf, 0),
            preprocess_us: read_u64(buf, 8),
            hardware_encode_us: read_u64(buf, 16),
            wait_for_buffer_us: read_u64(buf, 24),
            buffer_map_us: read_u64(buf, 32),
            colorspace_convert_us: read_u64(buf, 40),
            total_us: read_u64(buf, 48),
            acquire_attempts: read_u64(buf, 56),
            acquire_successes: read_u64(buf, 64),
        })
    }

    fn fields(&self) -> [u64; 9] {
        [
            self.timestamp,
            self.preprocess_us,
            self.hardware_encode_us,
            self.wait_for_buffer_us,
            self.buffer_map_us,
            self.colorspace_convert_us,
            self.total_us,
            self.acquire_attempts,
            self.acquire_successes,
        ]
    }

    /// Difference between this snapshot and an `earlier` one.
    ///
    /// Subtraction saturates, so a region that was recreated between the two
    /// snapshots yields zeros rather than a wrapped value.
    pub fn delta_since(&self, earlier: &FrameStats) -> FrameStatsDelta {
        FrameStatsDelta {
            elapsed_us: self.timestamp.saturating_sub(earlier.timestamp),
            preprocess_us: self.preprocess_us.saturating_sub(earlier.preprocess_us),
            hardware_encode_us: self.hardware_encode_us.saturating_sub(earlier.hardware_encode_us),
            wait_for_buffer_us: self.wait_for_buffer_us.saturating_sub(earlier.wait_for_buffer_us),
            buffer_map_us: self.buffer_map_us.saturating_sub(earlier.buffer_map_us),
            colorspace_convert_us: self
                .colorspace_convert_us
                .saturating_sub(earlier.colorspace_convert_us),
            total_us: self.total_us.saturating_sub(earlier.total_us),
            acquire_attempts: self.acquire_attempts.saturating_sub(earlier.acquire_attempts),
            acquire_successes: self.acquire_successes.saturating_sub(earlier.acquire_successes),
        }
    }
}

/// Counter differences between two [`FrameStats`] snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStatsDelta {
    pub elapsed_us: u64,
    pub preprocess_us: u64,
    pub hardware_encode_us: u64,
    pub wait_for_buffer_us: u64,
    pub buffer_map_us: u64,
    pub colorspace_convert_us: u64,
    pub total_us: u64,
    pub acquire_attempts: u64,
    pub acquire_successes: u64,
}

impl FrameStatsDelta {
    /// Fraction of slot acquisitions in the interval that did not time out.
    ///
    /// Returns `1.0` for an interval with no acquisitions.
    pub fn acquire_success_ratio(&self) -> f64 {
        if self.acquire_attempts == 0 {
            1.0
        } else {
            self.acquire_successes as f64 / self.acquire_attempts as f64
        }
    }

    /// Average total pipeline time per frame, given how many frames the interval covered.
    pub fn mean_total_us(&self, frames: u64) -> u64 {
        self.total_us.checked_div(frames).unwrap_or(0)
    }
}

/// Metadata stored with each texture slot.
///
/// `texture_id` is only meaningful inside the producer process identified by
/// `instance_id`; a consumer must turn the pair into a shared handle name
/// (see [`super::names::texture_handle_name`]) and open it through the GPU
/// interop layer before touching the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureFramePayload {
    pub stats: FrameStats,
    pub instance_id: u64,
    pub texture_id: u64,
}

impl TextureFramePayload {
    pub const SIZE: usize = FrameStats::SIZE + 16;

    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), LayoutError> {
        require_len(buf, Self::SIZE, "TextureFramePayload")?;
        self.stats.encode_into(&mut buf[..FrameStats::SIZE])?;
        write_u64(buf, FrameStats::SIZE, self.instance_id);
        write_u64(buf, FrameStats::SIZE + 8, self.texture_id);
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> Result<Self, LayoutError> {
        require_len(buf, Self::SIZE, "TextureFramePayload")?;
        Ok(Self {
            stats: FrameStats::decode(buf)?,
            instance_id: read_u64(buf, FrameStats::SIZE),
            texture_id: read_u64(buf, FrameStats::SIZE + 8),
        })
    }
}

/// Length of the NUL-padded codec name field.
pub const AUDIO_CODEC_NAME_LEN: usize = 16;

/// Number of planes a packed audio frame can describe.
pub const AUDIO_MAX_PLANES: usize = 8;

/// Format of the audio stream in the audio region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioFrameHeader {
    pub codec: [u8; AUDIO_CODEC_NAME_LEN],
    pub channels: u32,
    /// Samples per channel in one frame.
    pub frame_size: u32,
    pub bits_per_sample: u32,
    /// Opaque sample format identifier (planar/interleaved, int/float).
    pub sample_format: u32,
}

impl AudioFrameHeader {
    pub const SIZE: usize = AUDIO_CODEC_NAME_LEN + 16;

    /// Builds a header with `codec` truncated to fit the NUL-terminated field.
    pub fn with_codec(codec: &str, channels: u32, frame_size: u32, bits_per_sample: u32, sample_format: u32) -> Self {
        let mut field = [0u8; AUDIO_CODEC_NAME_LEN];
        let bytes = codec.as_bytes();
        let len = bytes.len().min(AUDIO_CODEC_NAME_LEN - 1);
        field[..len].copy_from_slice(&bytes[..len]);
        Self {
            codec: field,
            channels,
            frame_size,
            bits_per_sample,
            sample_format,
        }
    }

    /// Codec name up to the first NUL byte.  Non-UTF-8 names yield `""`.
    pub fn codec_name(&self) -> &str {
        let end = self.codec.iter().position(|&b| b == 0).unwrap_or(AUDIO_CODEC_NAME_LEN);
        std::str::from_utf8(&self.codec[..end]).unwrap_or("")
    }

    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), LayoutError> {
        require_len(buf, Self::SIZE, "AudioFrameHeader")?;
        buf[..AUDIO_CODEC_NAME_LEN].copy_from_slice(&self.codec);
        write_u32(buf, 16, self.channels);
        write_u32(buf, 20, self.frame_size);
        write_u32(buf, 24, self.bits_per_sample);
        write_u32(buf, 28, self.sample_format);
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> Result<Self, LayoutError> {
        require_len(buf, Self::SIZE, "AudioFrameHeader")?;
        let mut codec = [0u8; AUDIO_CODEC_NAME_LEN];
        codec.copy_from_slice(&buf[..AUDIO_CODEC_NAME_LEN]);
        Ok(Self {
            codec,
            channels: read_u32(buf, 16),
            frame_size: read_u32(buf, 20),
            bits_per_sample: read_u32(buf, 24),
            sample_format: read_u32(buf, 28),
        })
    }
}

/// Fixed part of the single rolling audio frame; the sample bytes follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedAudioFrameHeader {
    pub timestamp: u64,
    /// Bytes per plane; unused planes are zero.
    pub linesize: [u32; AUDIO_MAX_PLANES],
}

impl PackedAudioFrameHeader {
    pub const SIZE: usize = 8 + 4 * AUDIO_MAX_PLANES;

    /// Sum of all plane sizes, i.e. the sample bytes this frame describes.
    pub fn total_bytes(&self) -> u64 {
        self.linesize.iter().map(|&l| u64::from(l)).sum()
    }

    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), LayoutError> {
        require_len(buf, Self::SIZE, "PackedAudioFrameHeader")?;
        write_u64(buf, 0, self.timestamp);
        for (i, &size) in self.linesize.iter().enumerate() {
            write_u32(buf, 8 + i * 4, size);
        }
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> Result<Self, LayoutError> {
        require_len(buf, Self::SIZE, "PackedAudioFrameHeader")?;
        let mut linesize = [0u32; AUDIO_MAX_PLANES];
        for (i, slot) in linesize.iter_mut().enumerate() {
            *slot = read_u32(buf, 8 + i * 4);
        }
        Ok(Self {
            timestamp: read_u64(buf, 0),
            linesize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> FrameStats {
        FrameStats {
            timestamp: 1_000,
            preprocess_us: 10,
            hardware_encode_us: 20,
            wait_for_buffer_us: 30,
            buffer_map_us: 40,
            colorspace_convert_us: 50,
            total_us: 150,
            acquire_attempts: 7,
            acquire_successes: 6,
        }
    }

    #[test]
    fn test_frame_slot_header_with_content_requires_dimensions() {
        // Arrange
        let header = FrameSlotHeader {
            frame_kind: FrameKind::Texture,
            width: 1920,
            height: 0,
            ..Default::default()
        };

        // Act / Assert
        assert_eq!(
            header.validate(),
            Err(LayoutError::EmptyDimensions { width: 1920, height: 0 })
        );
    }

    #[test]
    fn test_frame_slot_header_without_content_may_be_empty() {
        assert!(FrameSlotHeader::default().validate().is_ok());
    }

    #[test]
    fn test_frame_slot_header_decodes_what_was_encoded() {
        let header = FrameSlotHeader {
            timestamp: 0xDEAD_BEEF_0000,
            frame_kind: FrameKind::Yuv,
            width: 1280,
            height: 720,
            pixel_format: 23,
            window_handle: 0x0001_0042,
        };
        let mut buf = [0u8; FrameSlotHeader::SIZE];
        header.encode_into(&mut buf).unwrap();

        assert_eq!(FrameSlotHeader::decode(&buf).unwrap(), header);
    }

    #[test]
    fn test_frame_slot_header_rejects_unknown_kind() {
        let mut buf = [0u8; FrameSlotHeader::SIZE];
        buf[8] = 9;
        assert_eq!(
            FrameSlotHeader::decode(&buf),
            Err(LayoutError::InvalidValue { field: "frame_kind", value: 9 })
        );
    }

    #[test]
    fn test_decode_short_buffer_returns_insufficient_data() {
        let result = FrameStats::decode(&[0u8; 10]);
        assert!(matches!(
            result,
            Err(LayoutError::InsufficientData { needed: 72, available: 10, .. })
        ));
    }

    #[test]
    fn test_encode_into_short_buffer_is_an_error_not_a_panic() {
        let mut buf = [0u8; 4];
        assert!(sample_stats().encode_into(&mut buf).is_err());
    }

    #[test]
    fn test_stats_delta_uses_differences() {
        // Arrange
        let earlier = sample_stats();
        let later = FrameStats {
            timestamp: 2_000,
            total_us: 450,
            acquire_attempts: 17,
            acquire_successes: 14,
            ..earlier
        };

        // Act
        let delta = later.delta_since(&earlier);

        // Assert
        assert_eq!(delta.elapsed_us, 1_000);
        assert_eq!(delta.total_us, 300);
        assert_eq!(delta.acquire_attempts, 10);
        assert_eq!(delta.acquire_successes, 8);
        assert_eq!(delta.preprocess_us, 0);
        assert!((delta.acquire_success_ratio() - 0.8).abs() < f64::EPSILON);
        assert_eq!(delta.mean_total_us(3), 100);
    }

    #[test]
    fn test_stats_delta_saturates_after_counter_reset() {
        let earlier = sample_stats();
        let delta = FrameStats::default().delta_since(&earlier);
        assert_eq!(delta, FrameStatsDelta::default());
        assert_eq!(delta.acquire_success_ratio(), 1.0);
        assert_eq!(delta.mean_total_us(0), 0);
    }

    #[test]
    fn test_texture_payload_keeps_stats_and_identity() {
        let payload = TextureFramePayload {
            stats: sample_stats(),
            instance_id: 4242,
            texture_id: 0xABCD,
        };
        let mut buf = vec![0u8; TextureFramePayload::SIZE];
        payload.encode_into(&mut buf).unwrap();
        assert_eq!(TextureFramePayload::decode(&buf).unwrap(), payload);
    }

    #[test]
    fn test_audio_codec_name_is_truncated_and_nul_terminated() {
        let header = AudioFrameHeader::with_codec("a-very-long-codec-name", 2, 480, 16, 1);
        assert_eq!(header.codec_name(), "a-very-long-cod");
        assert_eq!(header.codec[AUDIO_CODEC_NAME_LEN - 1], 0);

        let short = AudioFrameHeader::with_codec("opus", 2, 960, 32, 3);
        assert_eq!(short.codec_name(), "opus");
    }

    #[test]
    fn test_packed_audio_header_total_bytes_sums_planes() {
        let mut header = PackedAudioFrameHeader {
            timestamp: 5,
            ..Default::default()
        };
        header.linesize[0] = 1920;
        header.linesize[1] = 1920;
        assert_eq!(header.total_bytes(), 3840);

        let mut buf = [0u8; PackedAudioFrameHeader::SIZE];
        header.encode_into(&mut buf).unwrap();
        assert_eq!(PackedAudioFrameHeader::decode(&buf).unwrap(), header);
    }
}
