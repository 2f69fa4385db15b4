//! Memory-mapped named region holding the frame slots of one media kind.
//!
//! The region is a file under the configured shared-memory directory
//! (`/dev/shm` on Linux), mapped read-write by the producer and every
//! consumer.  Which side maps it first does not matter; the file stays until
//! it is removed, and its contents are just bytes in the page cache.
//!
//! ```text
//!  0                                    64
//! ┌──────────────────────────────────────┐
//! │ region header                        │
//! ├──────────────────────────────────────┤  64 + i * stride
//! │ slot i record header (256 bytes)     │
//! │   publish_seq  u64  (atomic)         │
//! │   read_seq     u64  (atomic)         │
//! │   timestamp    u64                   │
//! │   data_size    u64                   │
//! │   metadata     [u8; 224]             │
//! ├──────────────────────────────────────┤
//! │ slot i payload (slot_capacity bytes, │
//! │ rounded up to 64)                    │
//! └──────────────────────────────────────┘
//! ```
//!
//! # Memory ordering
//!
//! The producer writes the slot's plain fields and payload first, then
//! stores the slot's `publish_seq`, the region's `latest_slot` and the
//! region's `publish_seq`, all with `Release`.  Consumers load them with
//! `Acquire` before touching the payload.  That pairing, plus the event
//! signal that follows it, is the only synchronization between the two
//! processes.  There is no per-slot lock.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use cgt_core::frame::SlotIndex;
use cgt_core::layout::LayoutError;
use cgt_core::MediaKind;
use memmap2::MmapMut;
use tracing::{debug, info};

use crate::error::FrameError;

pub const REGION_MAGIC: [u8; 4] = *b"CGTF";
pub const REGION_VERSION: u32 = 1;
pub const REGION_HEADER_SIZE: usize = 64;
pub const SLOT_HEADER_SIZE: usize = 256;
pub const SLOT_METADATA_SIZE: usize = SLOT_HEADER_SIZE - SLOT_METADATA_OFFSET;

const PAYLOAD_ALIGN: u64 = 64;

// Region header offsets.
const MAGIC: usize = 0;
const VERSION: usize = 4;
const KIND: usize = 8;
const SLOT_COUNT: usize = 12;
const SLOT_CAPACITY: usize = 16;
const LATEST_SLOT: usize = 24;
const PUBLISH_SEQ: usize = 32;
const PRODUCER_PID: usize = 40;

// Slot record offsets, relative to the record.
const SLOT_PUBLISH_SEQ: usize = 0;
const SLOT_READ_SEQ: usize = 8;
const SLOT_TIMESTAMP: usize = 16;
const SLOT_DATA_SIZE: usize = 24;
const SLOT_METADATA_OFFSET: usize = 32;

/// Path of the file backing mapping `name`.
pub fn region_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.shm"))
}

/// Slot count and capacity of a region, as recorded in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionGeometry {
    pub kind: MediaKind,
    pub slot_count: u32,
    pub slot_capacity: u64,
}

impl RegionGeometry {
    /// Bytes per slot record; `None` if the capacity does not fit a `u64`
    /// once padded.
    pub fn slot_stride(&self) -> Option<u64> {
        self.slot_capacity
            .checked_next_multiple_of(PAYLOAD_ALIGN)?
            .checked_add(SLOT_HEADER_SIZE as u64)
    }

    /// Bytes in the whole mapping; `None` on overflow.
    pub fn total_size(&self) -> Option<u64> {
        u64::from(self.slot_count)
            .checked_mul(self.slot_stride()?)?
            .checked_add(REGION_HEADER_SIZE as u64)
    }

    /// Total size and stride, checked to be addressable in this process.
    fn layout(&self, path: &Path) -> Result<(u64, usize), FrameError> {
        let overflow = || FrameError::LayoutMismatch {
            path: path.to_path_buf(),
            reason: format!("slot geometry {self:?} overflows the address space"),
        };
        let total = self.total_size().ok_or_else(overflow)?;
        usize::try_from(total).map_err(|_| overflow())?;
        let stride = self.slot_stride().ok_or_else(overflow)?;
        Ok((total, stride as usize))
    }
}

/// A borrowed view of one slot's record.
#[derive(Debug, Clone, Copy)]
pub struct SlotRecord<'a> {
    pub slot: SlotIndex,
    pub publish_seq: u64,
    pub timestamp: u64,
    pub metadata: &'a [u8],
    pub data: &'a [u8],
}

pub struct SharedRegion {
    name: String,
    path: PathBuf,
    geometry: RegionGeometry,
    slot_stride: usize,
    mmap: MmapMut,
}

impl SharedRegion {
    /// Creates the region, or re-opens an existing one with the same geometry.
    ///
    /// Re-opening keeps the sequence counters, so consumers that stayed
    /// attached across a producer restart do not see old sequence numbers
    /// again.
    pub fn create(
        dir: &Path,
        name: &str,
        kind: MediaKind,
        slot_count: u32,
        slot_capacity: u64,
    ) -> Result<Self, FrameError> {
        let geometry = RegionGeometry {
            kind,
            slot_count,
            slot_capacity,
        };
        if slot_count == 0 {
            return Err(FrameError::LayoutMismatch {
                path: region_path(dir, name),
                reason: "a region needs at least one slot".to_string(),
            });
        }

        std::fs::create_dir_all(dir).map_err(|e| FrameError::named(name, e))?;
        let path = region_path(dir, name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| FrameError::named(name, e))?;

        let (expected, slot_stride) = geometry.layout(&path)?;
        let existing = file.metadata()?.len();
        if existing == 0 {
            file.set_len(expected)?;
        } else if existing != expected {
            return Err(FrameError::LayoutMismatch {
                path,
                reason: format!("file is {existing} bytes, expected {expected}"),
            });
        }

        // SAFETY: the file is opened read-write and sized above; other
        // processes may modify it, which is the purpose of the mapping.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        let mut region = Self {
            name: name.to_string(),
            path,
            geometry,
            slot_stride,
            mmap,
        };

        if region.mmap[MAGIC..MAGIC + 4] == [0u8; 4] {
            region.initialize_header();
            info!(region = name, kind = kind.label(), slot_count, slot_capacity, "created shared region");
        } else {
            let found = region.read_geometry()?;
            if found != geometry {
                return Err(FrameError::LayoutMismatch {
                    path: region.path.clone(),
                    reason: format!("existing region has {found:?}, expected {geometry:?}"),
                });
            }
            info!(
                region = name,
                kind = kind.label(),
                publish_seq = region.publish_seq(),
                "re-opened existing shared region"
            );
        }
        region.atomic_u32(PRODUCER_PID).store(std::process::id(), Ordering::Release);
        Ok(region)
    }

    /// Opens a region created by another process.
    ///
    /// A missing region is a fatal setup error for the caller.
    pub fn open(dir: &Path, name: &str) -> Result<Self, FrameError> {
        let path = region_path(dir, name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| FrameError::named(name, e))?;

        let len = file.metadata()?.len();
        if len < REGION_HEADER_SIZE as u64 {
            return Err(FrameError::LayoutMismatch {
                path,
                reason: format!("file is {len} bytes, shorter than the region header"),
            });
        }

        // SAFETY: see `create`.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        let mut region = Self {
            name: name.to_string(),
            path,
            geometry: RegionGeometry {
                kind: MediaKind::Audio,
                slot_count: 0,
                slot_capacity: 0,
            },
            slot_stride: 0,
            mmap,
        };
        region.geometry = region.read_geometry()?;
        let (expected, slot_stride) = region.geometry.layout(&region.path)?;
        if expected != len {
            return Err(FrameError::LayoutMismatch {
                path: region.path.clone(),
                reason: format!("file is {len} bytes, header describes {expected}"),
            });
        }
        region.slot_stride = slot_stride;
        debug!(region = name, geometry = ?region.geometry, "opened shared region");
        Ok(region)
    }

    fn initialize_header(&mut self) {
        let g = self.geometry;
        let header = &mut self.mmap[..REGION_HEADER_SIZE];
        header.fill(0);
        header[MAGIC..MAGIC + 4].copy_from_slice(&REGION_MAGIC);
        header[VERSION..VERSION + 4].copy_from_slice(&REGION_VERSION.to_le_bytes());
        header[KIND..KIND + 4].copy_from_slice(&(g.kind as u32).to_le_bytes());
        header[SLOT_COUNT..SLOT_COUNT + 4].copy_from_slice(&g.slot_count.to_le_bytes());
        header[SLOT_CAPACITY..SLOT_CAPACITY + 8].copy_from_slice(&g.slot_capacity.to_le_bytes());
    }

    fn read_geometry(&self) -> Result<RegionGeometry, FrameError> {
        let header = &self.mmap[..REGION_HEADER_SIZE];
        let mismatch = |reason: String| FrameError::LayoutMismatch {
            path: self.path.clone(),
            reason,
        };
        if header[MAGIC..MAGIC + 4] != REGION_MAGIC {
            return Err(mismatch("bad magic".to_string()));
        }
        let version = le_u32(header, VERSION);
        if version != REGION_VERSION {
            return Err(mismatch(format!("unsupported version {version}")));
        }
        let raw_kind = le_u32(header, KIND);
        let kind = MediaKind::from_u32(raw_kind).ok_or_else(|| mismatch(format!("unknown media kind {raw_kind}")))?;
        let slot_count = le_u32(header, SLOT_COUNT);
        if slot_count == 0 {
            return Err(mismatch("region has no slots".to_string()));
        }
        Ok(RegionGeometry {
            kind,
            slot_count,
            slot_capacity: le_u64(header, SLOT_CAPACITY),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn geometry(&self) -> RegionGeometry {
        self.geometry
    }

    pub fn kind(&self) -> MediaKind {
        self.geometry.kind
    }

    pub fn slot_count(&self) -> u32 {
        self.geometry.slot_count
    }

    pub fn slot_capacity(&self) -> u64 {
        self.geometry.slot_capacity
    }

    /// Process id of the producer that last created or re-opened the region.
    pub fn producer_pid(&self) -> u32 {
        self.atomic_u32(PRODUCER_PID).load(Ordering::Acquire)
    }

    /// Sequence number of the most recent publish; `0` before the first one.
    pub fn publish_seq(&self) -> u64 {
        self.atomic_u64(PUBLISH_SEQ).load(Ordering::Acquire)
    }

    pub fn latest_slot(&self) -> SlotIndex {
        SlotIndex::new(self.atomic_u32(LATEST_SLOT).load(Ordering::Acquire))
    }

    pub fn slot_publish_seq(&self, slot: SlotIndex) -> Result<u64, FrameError> {
        let base = self.slot_base(slot)?;
        Ok(self.atomic_u64(base + SLOT_PUBLISH_SEQ).load(Ordering::Acquire))
    }

    pub fn slot_read_seq(&self, slot: SlotIndex) -> Result<u64, FrameError> {
        let base = self.slot_base(slot)?;
        Ok(self.atomic_u64(base + SLOT_READ_SEQ).load(Ordering::Acquire))
    }

    /// Records that a consumer has read `slot` up to sequence `seq`.
    pub fn mark_read(&self, slot: SlotIndex, seq: u64) -> Result<(), FrameError> {
        let base = self.slot_base(slot)?;
        self.atomic_u64(base + SLOT_READ_SEQ).fetch_max(seq, Ordering::AcqRel);
        Ok(())
    }

    /// Writes a slot's plain fields and payload.  Not visible to consumers
    /// until [`SharedRegion::commit`].
    pub fn write_slot(
        &mut self,
        slot: SlotIndex,
        timestamp: u64,
        metadata: &[u8],
        data: &[u8],
    ) -> Result<(), FrameError> {
        let base = self.slot_base(slot)?;
        if data.len() as u64 > self.geometry.slot_capacity {
            return Err(FrameError::PayloadTooLarge {
                size: data.len() as u64,
                capacity: self.geometry.slot_capacity,
            });
        }
        if metadata.len() > SLOT_METADATA_SIZE {
            return Err(FrameError::PayloadTooLarge {
                size: metadata.len() as u64,
                capacity: SLOT_METADATA_SIZE as u64,
            });
        }

        let record = &mut self.mmap[base..base + SLOT_HEADER_SIZE + data.len()];
        record[SLOT_TIMESTAMP..SLOT_TIMESTAMP + 8].copy_from_slice(&timestamp.to_le_bytes());
        record[SLOT_DATA_SIZE..SLOT_DATA_SIZE + 8].copy_from_slice(&(data.len() as u64).to_le_bytes());
        let meta = &mut record[SLOT_METADATA_OFFSET..SLOT_HEADER_SIZE];
        meta[..metadata.len()].copy_from_slice(metadata);
        meta[metadata.len()..].fill(0);
        record[SLOT_HEADER_SIZE..].copy_from_slice(data);
        Ok(())
    }

    /// Makes a written slot visible as publish number `seq`.
    pub fn commit(&self, slot: SlotIndex, seq: u64) -> Result<(), FrameError> {
        let base = self.slot_base(slot)?;
        self.atomic_u64(base + SLOT_PUBLISH_SEQ).store(seq, Ordering::Release);
        self.atomic_u32(LATEST_SLOT).store(slot.get(), Ordering::Release);
        self.atomic_u64(PUBLISH_SEQ).store(seq, Ordering::Release);
        Ok(())
    }

    /// Borrows a slot's current record.
    ///
    /// The data span is clamped to the slot capacity, so a corrupted
    /// `data_size` cannot reach past the slot.
    pub fn slot_record(&self, slot: SlotIndex) -> Result<SlotRecord<'_>, FrameError> {
        let base = self.slot_base(slot)?;
        let publish_seq = self.atomic_u64(base + SLOT_PUBLISH_SEQ).load(Ordering::Acquire);
        let header = &self.mmap[base..base + SLOT_HEADER_SIZE];
        let data_size = le_u64(header, SLOT_DATA_SIZE).min(self.geometry.slot_capacity) as usize;
        let data_start = base + SLOT_HEADER_SIZE;
        Ok(SlotRecord {
            slot,
            publish_seq,
            timestamp: le_u64(header, SLOT_TIMESTAMP),
            metadata: &header[SLOT_METADATA_OFFSET..],
            data: &self.mmap[data_start..data_start + data_size],
        })
    }

    fn slot_base(&self, slot: SlotIndex) -> Result<usize, FrameError> {
        if slot.get() >= self.geometry.slot_count {
            return Err(FrameError::Layout(LayoutError::InvalidValue {
                field: "slot",
                value: u64::from(slot.get()),
            }));
        }
        Ok(REGION_HEADER_SIZE + slot.as_usize() * self.slot_stride)
    }

    fn atomic_u64(&self, offset: usize) -> &AtomicU64 {
        debug_assert!(offset % 8 == 0 && offset + 8 <= self.mmap.len());
        // SAFETY: the mapping is page aligned and every atomic offset is a
        // multiple of 8 inside the mapping; the reference cannot outlive it.
        unsafe { &*(self.mmap.as_ptr().add(offset) as *const AtomicU64) }
    }

    fn atomic_u32(&self, offset: usize) -> &AtomicU32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.mmap.len());
        // SAFETY: as for `atomic_u64`, with 4-byte alignment.
        unsafe { &*(self.mmap.as_ptr().add(offset) as *const AtomicU32) }
    }
}

fn le_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn le_u64(buf: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(raw)
}
