//! Consumer side of the frame transport, running in the streaming process.
//!
//! The consumer always reads the most recently published slot.  Signals are
//! not queued, so a consumer that falls behind skips frames rather than
//! replaying them: each successful read returns a sequence number strictly
//! greater than the previous one.

use std::time::Duration;

use cgt_core::frame::{SlotIndex, StreamState};
use cgt_core::layout::{FrameSlotHeader, FrameStats};
use cgt_core::MediaKind;
use tracing::{debug, info};

use super::payload::{decode_stats, FramePayloadView};
use crate::error::FrameError;
use crate::infrastructure::info_region::VideoInfoRegion;
use crate::infrastructure::named_event::NamedEvent;
use crate::infrastructure::shared_region::{SharedRegion, SlotRecord};
use crate::infrastructure::storage::config::FramesConfig;

pub struct FrameConsumer {
    kind: MediaKind,
    region: SharedRegion,
    info: Option<VideoInfoRegion>,
    frame_ready: NamedEvent,
    started: NamedEvent,
    stopped: NamedEvent,
    do_not_present: NamedEvent,
    last_seen: u64,
}

impl FrameConsumer {
    /// Opens the region and events a producer created for `kind`.
    ///
    /// Fails with [`FrameError::NamedObject`] if the producer has not
    /// created them yet.
    pub fn open(config: &FramesConfig, kind: MediaKind) -> Result<Self, FrameError> {
        let dir = config.shm.dir.as_path();
        let names = config.names.for_kind(kind);

        let region = SharedRegion::open(dir, &names.mapping)?;
        if region.kind() != kind {
            return Err(FrameError::LayoutMismatch {
                path: region.path().to_path_buf(),
                reason: format!("region holds {} frames, expected {}", region.kind().label(), kind.label()),
            });
        }
        let info = match kind {
            MediaKind::VideoYuv | MediaKind::VideoTexture => {
                Some(VideoInfoRegion::open(dir, &config.names.video_info)?)
            }
            MediaKind::Audio => None,
        };

        let consumer = Self {
            kind,
            frame_ready: NamedEvent::open(dir, &names.frame_ready)?,
            started: NamedEvent::open(dir, &names.started)?,
            stopped: NamedEvent::open(dir, &names.stopped)?,
            do_not_present: NamedEvent::open(dir, &config.names.do_not_present)?,
            region,
            info,
            last_seen: 0,
        };
        info!(
            kind = kind.label(),
            mapping = %names.mapping,
            producer_pid = consumer.region.producer_pid(),
            "frame consumer attached"
        );
        Ok(consumer)
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Sequence number of the last frame returned by `wait_and_read`.
    pub fn last_sequence(&self) -> u64 {
        self.last_seen
    }

    /// Waits up to `timeout` for a new frame and borrows it.
    ///
    /// Returns `Ok(None)` on timeout, and also when the wake-up carried no
    /// frame newer than the last one returned.  A timeout says nothing about
    /// whether the producer is alive; check [`FrameConsumer::is_stopped`].
    pub fn wait_and_read(&mut self, timeout: Duration) -> Result<Option<FrameView<'_>>, FrameError> {
        let pending = self.region.publish_seq() > self.last_seen;
        let wait_for = if pending { Duration::ZERO } else { timeout };
        let signaled = self.frame_ready.wait(wait_for)?;
        if !signaled && !pending {
            return Ok(None);
        }

        let slot = self.region.latest_slot();
        let record = self.region.slot_record(slot)?;
        if record.publish_seq <= self.last_seen {
            debug!(kind = self.kind.label(), seq = record.publish_seq, "wake-up without a new frame");
            return Ok(None);
        }
        self.last_seen = record.publish_seq;

        Ok(Some(FrameView {
            kind: self.kind,
            region: &self.region,
            record,
        }))
    }

    /// Stream state derived from the `started`/`stopped` events.
    pub fn producer_state(&self) -> Result<StreamState, FrameError> {
        if self.stopped.is_set()? {
            return Ok(StreamState::Stopped);
        }
        if !self.started.is_set()? {
            return Ok(StreamState::Stopped);
        }
        if self.region.publish_seq() > 0 {
            Ok(StreamState::Streaming)
        } else {
            Ok(StreamState::Started)
        }
    }

    /// Whether the producer has signaled `stopped`.  Terminal for the session.
    pub fn is_stopped(&self) -> Result<bool, FrameError> {
        self.stopped.is_set()
    }

    /// Asks the captured process to stop (or resume) presenting locally.
    pub fn suppress_local_present(&self, suppress: bool) -> Result<(), FrameError> {
        if suppress {
            self.do_not_present.set()
        } else {
            self.do_not_present.reset()
        }
    }

    /// Reads the video-frame-info mapping.
    pub fn read_info(&self) -> Result<FrameSlotHeader, FrameError> {
        match &self.info {
            Some(info) => info.read(),
            None => Err(FrameError::KindMismatch {
                channel: self.kind,
                payload: "video info",
            }),
        }
    }
}

/// A borrowed, zero-copy view of one published slot.
///
/// The slot is marked as read when the view is dropped, which lets the
/// producer reuse it without reporting a pending acquire.  The producer may
/// still overwrite a slot under a view that is held for longer than one
/// frame period.
pub struct FrameView<'a> {
    kind: MediaKind,
    region: &'a SharedRegion,
    record: SlotRecord<'a>,
}

impl<'a> FrameView<'a> {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn slot(&self) -> SlotIndex {
        self.record.slot
    }

    pub fn sequence(&self) -> u64 {
        self.record.publish_seq
    }

    pub fn timestamp(&self) -> u64 {
        self.record.timestamp
    }

    pub fn stats(&self) -> Result<FrameStats, FrameError> {
        decode_stats(self.record.metadata)
    }

    pub fn payload(&self) -> Result<FramePayloadView<'a>, FrameError> {
        FramePayloadView::decode(self.kind, self.record.metadata, self.record.data)
    }
}

impl Drop for FrameView<'_> {
    fn drop(&mut self) {
        let _ = self.region.mark_read(self.record.slot, self.record.publish_seq);
    }
}
