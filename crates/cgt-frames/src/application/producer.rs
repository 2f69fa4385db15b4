//! Producer side of the frame transport, running inside the captured process.
//!
//! Per frame the capture pipeline calls [`FrameProducer::acquire_slot`],
//! fills its buffers, then [`FrameProducer::publish`].  Neither call blocks
//! for longer than the configured acquire timeout: when the consumer has not
//! yet read the slot's previous frame the producer overwrites it anyway,
//! because a fresh frame is worth more to a live stream than a complete one.

use std::thread;
use std::time::{Duration, Instant};

use cgt_core::frame::{KindRing, SlotIndex, StreamSignal, StreamState};
use cgt_core::layout::{ChannelSet, FrameSlotHeader, FrameStats};
use cgt_core::MediaKind;
use tracing::{debug, info, warn};

use super::payload::{decode_stats, FramePayload};
use crate::error::FrameError;
use crate::infrastructure::info_region::VideoInfoRegion;
use crate::infrastructure::named_event::{EventMode, NamedEvent};
use crate::infrastructure::shared_region::SharedRegion;
use crate::infrastructure::storage::config::FramesConfig;

const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Permission to write one slot, obtained from [`FrameProducer::acquire_slot`].
#[derive(Debug, PartialEq, Eq)]
pub struct SlotHandle {
    slot: SlotIndex,
}

impl SlotHandle {
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }
}

/// Outcome of a slot acquisition.
#[derive(Debug, PartialEq, Eq)]
pub enum SlotAcquire {
    /// The consumer has read the slot's previous frame.
    Ready(SlotHandle),
    /// The consumer did not read the previous frame in time.  Publishing
    /// to this handle overwrites it, which drops that frame.
    Pending(SlotHandle),
}

impl SlotAcquire {
    pub fn is_ready(&self) -> bool {
        matches!(self, SlotAcquire::Ready(_))
    }

    pub fn into_handle(self) -> SlotHandle {
        match self {
            SlotAcquire::Ready(h) | SlotAcquire::Pending(h) => h,
        }
    }
}

pub struct FrameProducer {
    kind: MediaKind,
    names: ChannelSet,
    region: SharedRegion,
    info: Option<VideoInfoRegion>,
    frame_ready: NamedEvent,
    started: NamedEvent,
    stopped: NamedEvent,
    do_not_present: NamedEvent,
    ring: KindRing,
    state: StreamState,
    acquire_timeout: Duration,
    acquire_attempts: u64,
    acquire_successes: u64,
    pending_streak: u64,
    stop_signaled: bool,
}

impl FrameProducer {
    /// Creates the region and events for `kind`.
    ///
    /// Video producers also create the video-info mapping.  The shared
    /// do-not-present event is opened if another producer already created it.
    pub fn create(config: &FramesConfig, kind: MediaKind) -> Result<Self, FrameError> {
        let dir = config.shm.dir.as_path();
        let names = config.names.for_kind(kind).clone();

        let region = SharedRegion::create(
            dir,
            &names.mapping,
            kind,
            config.shm.slot_count(kind),
            config.shm.slot_capacity(kind),
        )?;
        let info = match kind {
            MediaKind::VideoYuv | MediaKind::VideoTexture => {
                Some(VideoInfoRegion::create(dir, &config.names.video_info)?)
            }
            MediaKind::Audio => None,
        };
        let frame_ready = NamedEvent::create(dir, &names.frame_ready, EventMode::AutoReset)?;
        let started = NamedEvent::create(dir, &names.started, EventMode::ManualReset)?;
        let stopped = NamedEvent::create(dir, &names.stopped, EventMode::ManualReset)?;
        let do_not_present = match NamedEvent::open(dir, &config.names.do_not_present) {
            Ok(event) => event,
            Err(_) => NamedEvent::create(dir, &config.names.do_not_present, EventMode::ManualReset)?,
        };

        let (acquire_attempts, acquire_successes) = resume_acquire_counters(&region, kind);
        info!(kind = kind.label(), mapping = %names.mapping, "frame producer created");

        Ok(Self {
            kind,
            names,
            region,
            info,
            frame_ready,
            started,
            stopped,
            do_not_present,
            ring: KindRing::for_kind(kind),
            state: StreamState::Stopped,
            acquire_timeout: config.shm.acquire_timeout(),
            acquire_attempts,
            acquire_successes,
            pending_streak: 0,
            stop_signaled: false,
        })
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Sequence number of the most recent publish.
    pub fn sequence(&self) -> u64 {
        self.region.publish_seq()
    }

    /// Running `(attempts, successes)` of slot acquisition.
    pub fn acquire_counters(&self) -> (u64, u64) {
        (self.acquire_attempts, self.acquire_successes)
    }

    /// Begins a session: clears `stopped` and sets `started`.
    pub fn start(&mut self) -> Result<(), FrameError> {
        self.state = self.state.on(StreamSignal::Started)?;
        self.stopped.reset()?;
        self.started.set()?;
        self.stop_signaled = false;
        info!(kind = self.kind.label(), "frame stream started");
        Ok(())
    }

    /// Picks the next slot in the rotation and waits, up to the acquire
    /// timeout, for the consumer to have read its previous frame.
    pub fn acquire_slot(&mut self) -> Result<SlotAcquire, FrameError> {
        let slot = self.ring.peek();
        self.acquire_attempts += 1;
        // An acquire timeout too large for an `Instant` never expires.
        let deadline = Instant::now().checked_add(self.acquire_timeout);

        loop {
            let published = self.region.slot_publish_seq(slot)?;
            let read = self.region.slot_read_seq(slot)?;
            if published == 0 || read >= published {
                self.acquire_successes += 1;
                self.pending_streak = 0;
                return Ok(SlotAcquire::Ready(SlotHandle { slot }));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                self.pending_streak += 1;
                if self.pending_streak == 1 {
                    warn!(
                        kind = self.kind.label(),
                        %slot,
                        published,
                        read,
                        "consumer has not read the previous frame; overwriting"
                    );
                } else {
                    debug!(kind = self.kind.label(), %slot, streak = self.pending_streak, "slot still pending");
                }
                return Ok(SlotAcquire::Pending(SlotHandle { slot }));
            }
            thread::sleep(ACQUIRE_POLL_INTERVAL);
        }
    }

    /// Writes `payload` into the acquired slot and signals `frame-ready`.
    ///
    /// The acquire counters in `stats` are replaced with the producer's own.
    /// Returns the publish sequence number.
    pub fn publish(
        &mut self,
        handle: SlotHandle,
        payload: FramePayload<'_>,
        stats: FrameStats,
    ) -> Result<u64, FrameError> {
        if payload.kind() != self.kind {
            return Err(FrameError::KindMismatch {
                channel: self.kind,
                payload: payload.kind().label(),
            });
        }
        let expected = self.ring.peek();
        if handle.slot != expected {
            return Err(FrameError::StaleSlot {
                slot: handle.slot,
                expected,
            });
        }
        let next_state = self.state.on(StreamSignal::FrameReady)?;

        let stats = FrameStats {
            acquire_attempts: self.acquire_attempts,
            acquire_successes: self.acquire_successes,
            ..stats
        };
        let metadata = payload.encode_metadata(&stats)?;
        let timestamp = payload.timestamp(&stats);
        self.region.write_slot(handle.slot, timestamp, &metadata, payload.data())?;

        let seq = self.region.publish_seq() + 1;
        self.region.commit(handle.slot, seq)?;
        self.ring.next();
        self.state = next_state;
        self.frame_ready.set()?;

        debug!(kind = self.kind.label(), slot = %handle.slot, seq, timestamp, "frame published");
        Ok(seq)
    }

    /// Updates the video-frame-info mapping.
    pub fn publish_info(&mut self, header: &FrameSlotHeader) -> Result<(), FrameError> {
        let kind = self.kind;
        let info = self.info.as_mut().ok_or(FrameError::KindMismatch {
            channel: kind,
            payload: "video info",
        })?;
        info.write(header)
    }

    /// Whether the captured process should keep presenting frames locally.
    pub fn should_present(&self) -> Result<bool, FrameError> {
        Ok(!self.do_not_present.is_set()?)
    }

    /// Signals `stopped`.  Only the first call after a start has an effect.
    pub fn stop(&mut self) -> Result<(), FrameError> {
        if self.stop_signaled {
            return Ok(());
        }
        self.state = self.state.on(StreamSignal::Stopped)?;
        self.started.reset()?;
        self.stopped.set()?;
        self.stop_signaled = true;
        info!(kind = self.kind.label(), mapping = %self.names.mapping, "frame stream stopped");
        Ok(())
    }
}

/// Acquire counters stamped into the region's latest frame, or zero for a
/// region nothing has been published to.
///
/// The counters never decrease over the lifetime of the region, including
/// across producer restarts.
fn resume_acquire_counters(region: &SharedRegion, kind: MediaKind) -> (u64, u64) {
    if region.publish_seq() == 0 {
        return (0, 0);
    }
    let stats = region
        .slot_record(region.latest_slot())
        .and_then(|record| decode_stats(record.metadata));
    match stats {
        Ok(stats) => {
            debug!(
                kind = kind.label(),
                attempts = stats.acquire_attempts,
                successes = stats.acquire_successes,
                "resuming acquire counters"
            );
            (stats.acquire_attempts, stats.acquire_successes)
        }
        Err(e) => {
            warn!(kind = kind.label(), error = %e, "latest frame stats unreadable; acquire counters restart at zero");
            (0, 0)
        }
    }
}

impl Drop for FrameProducer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(kind = self.kind.label(), error = %e, "failed to signal stop on teardown");
        }
    }
}
