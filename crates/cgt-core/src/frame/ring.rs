//! Slot rotation for the shared frame regions.
//!
//! Texture frames are double-buffered: the producer always writes the slot
//! *other* than the one it signaled last, which gives a consumer one full
//! frame period to finish reading before that slot is touched again.
//! [`SlotRing`] makes the alternation structural instead of leaving it to
//! caller discipline.  It does not make the hand-off race-free; a consumer
//! slower than one frame period can still see its slot overwritten.

use std::fmt;

use crate::layout::MediaKind;

/// Number of texture slots in the video-texture region.
pub const NUMBER_OF_SHARED_FRAMES: usize = 2;

/// Index of one slot inside a shared region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SlotIndex(u32);

impl SlotIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// Strict round-robin over `N` slots.
///
/// The first call to [`SlotRing::next`] yields slot 0.
#[derive(Debug, Clone)]
pub struct SlotRing<const N: usize> {
    next: usize,
}

impl<const N: usize> SlotRing<N> {
    /// `N` must be at least 1.
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Slot the next [`SlotRing::next`] call will return.
    pub fn peek(&self) -> SlotIndex {
        SlotIndex(self.next as u32)
    }

    /// Returns the next slot and advances the ring.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> SlotIndex {
        let current = self.next;
        self.next = (current + 1) % N;
        SlotIndex(current as u32)
    }
}

impl<const N: usize> Default for SlotRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// How many slots a region of `kind` holds.
///
/// Audio and YUV use a single rolling slot; staleness is detected by timestamp.
pub const fn slot_count(kind: MediaKind) -> usize {
    match kind {
        MediaKind::VideoTexture => NUMBER_OF_SHARED_FRAMES,
        MediaKind::Audio | MediaKind::VideoYuv => 1,
    }
}

/// A ring sized at runtime from the region's media kind.
///
/// The region header stores the slot count, so the producer cannot pick the
/// const-generic ring at compile time.
#[derive(Debug, Clone)]
pub enum KindRing {
    Single(SlotRing<1>),
    Double(SlotRing<NUMBER_OF_SHARED_FRAMES>),
}

impl KindRing {
    pub fn for_kind(kind: MediaKind) -> Self {
        match slot_count(kind) {
            NUMBER_OF_SHARED_FRAMES => KindRing::Double(SlotRing::new()),
            _ => KindRing::Single(SlotRing::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            KindRing::Single(r) => r.len(),
            KindRing::Double(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn peek(&self) -> SlotIndex {
        match self {
            KindRing::Single(r) => r.peek(),
            KindRing::Double(r) => r.peek(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> SlotIndex {
        match self {
            KindRing::Single(r) => r.next(),
            KindRing::Double(r) => r.next(),
        }
    }
}
