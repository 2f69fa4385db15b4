//! Frame payloads and how they are laid out in a slot.
//!
//! Every slot carries a 224-byte metadata block followed by the payload
//! bytes.  The block always starts with the frame's [`FrameStats`]:
//!
//! ```text
//! kind     metadata                                         payload bytes
//! yuv      FrameStats                                       raw YUV frame
//! texture  FrameStats, instance_id, texture_id              (none)
//! audio    FrameStats, AudioFrameHeader, PackedAudioHeader  sample planes
//! ```

use cgt_core::layout::{AudioFrameHeader, FrameStats, PackedAudioFrameHeader, TextureFramePayload};
use cgt_core::MediaKind;

use crate::error::FrameError;
use crate::infrastructure::shared_region::SLOT_METADATA_SIZE;

const AUDIO_HEADER_OFFSET: usize = FrameStats::SIZE;
const PACKED_AUDIO_OFFSET: usize = AUDIO_HEADER_OFFSET + AudioFrameHeader::SIZE;

const _: () = assert!(PACKED_AUDIO_OFFSET + PackedAudioFrameHeader::SIZE <= SLOT_METADATA_SIZE);
const _: () = assert!(TextureFramePayload::SIZE <= SLOT_METADATA_SIZE);

/// What the producer hands to [`crate::FrameProducer::publish`].
#[derive(Debug, Clone, Copy)]
pub enum FramePayload<'a> {
    Yuv(&'a [u8]),
    /// A GPU texture that stays inside the producer process; only its
    /// identity crosses the boundary.
    Texture { instance_id: u64, texture_id: u64 },
    Audio {
        header: AudioFrameHeader,
        frame: PackedAudioFrameHeader,
        data: &'a [u8],
    },
}

impl FramePayload<'_> {
    pub fn kind(&self) -> MediaKind {
        match self {
            FramePayload::Yuv(_) => MediaKind::VideoYuv,
            FramePayload::Texture { .. } => MediaKind::VideoTexture,
            FramePayload::Audio { .. } => MediaKind::Audio,
        }
    }

    /// Capture timestamp recorded in the slot.
    pub(crate) fn timestamp(&self, stats: &FrameStats) -> u64 {
        match self {
            FramePayload::Audio { frame, .. } => frame.timestamp,
            _ => stats.timestamp,
        }
    }

    /// Bytes that follow the metadata block.
    pub(crate) fn data(&self) -> &[u8] {
        match self {
            FramePayload::Yuv(data) => data,
            FramePayload::Texture { .. } => &[],
            FramePayload::Audio { data, .. } => data,
        }
    }

    /// Builds the slot metadata block, checking the payload is coherent.
    pub(crate) fn encode_metadata(&self, stats: &FrameStats) -> Result<[u8; SLOT_METADATA_SIZE], FrameError> {
        let mut meta = [0u8; SLOT_METADATA_SIZE];
        match self {
            FramePayload::Yuv(_) => {
                stats.encode_into(&mut meta)?;
            }
            FramePayload::Texture {
                instance_id,
                texture_id,
            } => {
                TextureFramePayload {
                    stats: *stats,
                    instance_id: *instance_id,
                    texture_id: *texture_id,
                }
                .encode_into(&mut meta)?;
            }
            FramePayload::Audio { header, frame, data } => {
                let declared = frame.total_bytes();
                if declared != data.len() as u64 {
                    return Err(FrameError::PayloadSizeMismatch {
                        declared,
                        actual: data.len() as u64,
                    });
                }
                stats.encode_into(&mut meta)?;
                header.encode_into(&mut meta[AUDIO_HEADER_OFFSET..])?;
                frame.encode_into(&mut meta[PACKED_AUDIO_OFFSET..])?;
            }
        }
        Ok(meta)
    }
}

/// A decoded, borrowed view of a slot's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePayloadView<'a> {
    Yuv(&'a [u8]),
    Texture(TextureFramePayload),
    Audio {
        header: AudioFrameHeader,
        frame: PackedAudioFrameHeader,
        data: &'a [u8],
    },
}

impl<'a> FramePayloadView<'a> {
    pub(crate) fn decode(kind: MediaKind, metadata: &[u8], data: &'a [u8]) -> Result<Self, FrameError> {
        Ok(match kind {
            MediaKind::VideoYuv => FramePayloadView::Yuv(data),
            MediaKind::VideoTexture => FramePayloadView::Texture(TextureFramePayload::decode(metadata)?),
            MediaKind::Audio => FramePayloadView::Audio {
                header: AudioFrameHeader::decode(&metadata[AUDIO_HEADER_OFFSET..])?,
                frame: PackedAudioFrameHeader::decode(&metadata[PACKED_AUDIO_OFFSET..])?,
                data,
            },
        })
    }
}

pub(crate) fn decode_stats(metadata: &[u8]) -> Result<FrameStats, FrameError> {
    Ok(FrameStats::decode(metadata)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_metadata_decodes_back_to_the_same_headers() {
        // Arrange
        let header = AudioFrameHeader::with_codec("pcm_f32le", 2, 480, 32, 3);
        let mut frame = PackedAudioFrameHeader {
            timestamp: 99,
            ..Default::default()
        };
        frame.linesize[0] = 8;
        let data = [0u8; 8];
        let payload = FramePayload::Audio {
            header,
            frame,
            data: &data,
        };

        // Act
        let meta = payload.encode_metadata(&FrameStats::default()).unwrap();
        let view = FramePayloadView::decode(MediaKind::Audio, &meta, &data).unwrap();

        // Assert
        assert_eq!(
            view,
            FramePayloadView::Audio {
                header,
                frame,
                data: &data
            }
        );
        assert_eq!(payload.timestamp(&FrameStats::default()), 99);
    }

    #[test]
    fn test_audio_plane_sizes_must_match_data() {
        let frame = PackedAudioFrameHeader {
            timestamp: 1,
            linesize: [4, 4, 0, 0, 0, 0, 0, 0],
        };
        let payload = FramePayload::Audio {
            header: AudioFrameHeader::default(),
            frame,
            data: &[0u8; 6],
        };
        assert!(matches!(
            payload.encode_metadata(&FrameStats::default()),
            Err(FrameError::PayloadSizeMismatch { declared: 8, actual: 6 })
        ));
    }

    #[test]
    fn test_every_kind_starts_metadata_with_stats() {
        let stats = FrameStats {
            timestamp: 5,
            total_us: 12,
            ..Default::default()
        };
        let payloads = [
            FramePayload::Yuv(&[1, 2, 3]),
            FramePayload::Texture {
                instance_id: 1,
                texture_id: 2,
            },
        ];
        for payload in payloads {
            let meta = payload.encode_metadata(&stats).unwrap();
            assert_eq!(decode_stats(&meta).unwrap(), stats);
        }
    }
}
