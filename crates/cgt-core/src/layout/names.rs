//! Well-known names of the shared mappings and events.
//!
//! Producer and consumer processes never exchange these names at runtime;
//! both sides must agree on them ahead of time.  They are gathered here in a
//! single table (loadable from configuration) instead of being scattered as
//! string literals through the producer and consumer code.
//!
//! Every media kind owns four names: the mapping that holds its slots, and
//! the `frame-ready`, `started` and `stopped` events.  One additional event,
//! `do-not-present`, is shared by all kinds and lets the streaming side ask
//! the captured process to stop presenting frames locally.

use serde::{Deserialize, Serialize};

/// The media carried by one shared mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum MediaKind {
    /// Interleaved or planar PCM packets, single rolling slot.
    Audio = 1,
    /// Raw YUV frames copied into the region, single slot.
    VideoYuv = 2,
    /// GPU texture handles, double-buffered.
    VideoTexture = 3,
}

impl MediaKind {
    /// All kinds, in a stable order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Audio, MediaKind::VideoYuv, MediaKind::VideoTexture];

    /// Converts the discriminant stored in a region header back to a kind.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(MediaKind::Audio),
            2 => Some(MediaKind::VideoYuv),
            3 => Some(MediaKind::VideoTexture),
            _ => None,
        }
    }

    /// Short label used in logs and on the command line.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::VideoYuv => "video-yuv",
            MediaKind::VideoTexture => "video-texture",
        }
    }
}

/// The four names belonging to one media kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSet {
    pub mapping: String,
    pub frame_ready: String,
    pub started: String,
    pub stopped: String,
}

impl ChannelSet {
    fn with_prefix(prefix: &str) -> Self {
        Self {
            mapping: format!("{prefix}_frames"),
            frame_ready: format!("{prefix}_frame_ready"),
            started: format!("{prefix}_started"),
            stopped: format!("{prefix}_stopped"),
        }
    }
}

/// Name table for every shared object used by the frame transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelNames {
    /// Mapping that holds the current [`super::FrameSlotHeader`].
    #[serde(default = "default_video_info")]
    pub video_info: String,
    /// Manual-reset event; while set, the producer should not present locally.
    #[serde(default = "default_do_not_present")]
    pub do_not_present: String,
    /// Prefix of cross-process texture handle names.
    #[serde(default = "default_texture_prefix")]
    pub texture_prefix: String,
    #[serde(default = "default_audio")]
    pub audio: ChannelSet,
    #[serde(default = "default_video_yuv")]
    pub video_yuv: ChannelSet,
    #[serde(default = "default_video_texture")]
    pub video_texture: ChannelSet,
}

fn default_audio() -> ChannelSet {
    ChannelSet::with_prefix("cgt_audio")
}
fn default_video_yuv() -> ChannelSet {
    ChannelSet::with_prefix("cgt_video_yuv")
}
fn default_video_texture() -> ChannelSet {
    ChannelSet::with_prefix("cgt_video_texture")
}
fn default_video_info() -> String {
    "cgt_video_frame_info".to_string()
}
fn default_do_not_present() -> String {
    "cgt_do_not_present".to_string()
}
fn default_texture_prefix() -> String {
    "cgt_shared_texture".to_string()
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            audio: default_audio(),
            video_yuv: default_video_yuv(),
            video_texture: default_video_texture(),
            video_info: default_video_info(),
            do_not_present: default_do_not_present(),
            texture_prefix: default_texture_prefix(),
        }
    }
}

impl ChannelNames {
    /// Builds the full table under a different prefix.
    ///
    /// `with_prefix("cgt")` is the default table.  A distinct prefix lets two
    /// sessions share one machine (and one shm directory) without colliding.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            audio: ChannelSet::with_prefix(&format!("{prefix}_audio")),
            video_yuv: ChannelSet::with_prefix(&format!("{prefix}_video_yuv")),
            video_texture: ChannelSet::with_prefix(&format!("{prefix}_video_texture")),
            video_info: format!("{prefix}_video_frame_info"),
            do_not_present: format!("{prefix}_do_not_present"),
            texture_prefix: format!("{prefix}_shared_texture"),
        }
    }

    /// Returns the names owned by `kind`.
    pub fn for_kind(&self, kind: MediaKind) -> &ChannelSet {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::VideoYuv => &self.video_yuv,
            MediaKind::VideoTexture => &self.video_texture,
        }
    }

    /// Name under which the producer exports texture `texture_id`.
    pub fn texture_handle_name(&self, instance_id: u64, texture_id: u64) -> String {
        texture_handle_name(&self.texture_prefix, instance_id, texture_id)
    }
}

/// Formats the out-of-band name of a shared GPU texture.
///
/// The instance id (normally the producer's process id) keeps names from two
/// concurrently captured processes apart.
pub fn texture_handle_name(prefix: &str, instance_id: u64, texture_id: u64) -> String {
    format!("{prefix}_{instance_id}_{texture_id}")
}
