//! The video-frame-info mapping: one [`FrameSlotHeader`] behind a sequence lock.
//!
//! The header is rewritten whenever the captured window changes size or
//! format, far less often than frames are published.  Readers retry while a
//! write is in progress (odd sequence) or when the sequence moved under them.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{fence, AtomicU64, Ordering};

use cgt_core::layout::FrameSlotHeader;
use memmap2::MmapMut;

use crate::error::FrameError;

const INFO_MAGIC: [u8; 4] = *b"CGTI";
const INFO_SIZE: u64 = 64;
const MAGIC: usize = 0;
const SEQ: usize = 8;
const HEADER: usize = 16;
const MAX_READ_ATTEMPTS: usize = 1024;

fn info_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.shm"))
}

pub struct VideoInfoRegion {
    path: PathBuf,
    mmap: MmapMut,
}

impl VideoInfoRegion {
    pub fn create(dir: &Path, name: &str) -> Result<Self, FrameError> {
        std::fs::create_dir_all(dir).map_err(|e| FrameError::named(name, e))?;
        let path = info_path(dir, name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| FrameError::named(name, e))?;
        if file.metadata()?.len() != INFO_SIZE {
            file.set_len(INFO_SIZE)?;
        }
        // SAFETY: read-write file of INFO_SIZE bytes; other processes map it too.
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        mmap[MAGIC..MAGIC + 4].copy_from_slice(&INFO_MAGIC);
        Ok(Self { path, mmap })
    }

    pub fn open(dir: &Path, name: &str) -> Result<Self, FrameError> {
        let path = info_path(dir, name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| FrameError::named(name, e))?;
        if file.metadata()?.len() != INFO_SIZE {
            return Err(FrameError::LayoutMismatch {
                path,
                reason: "video info mapping has the wrong size".to_string(),
            });
        }
        // SAFETY: as in `create`.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        if mmap[MAGIC..MAGIC + 4] != INFO_MAGIC {
            return Err(FrameError::LayoutMismatch {
                path,
                reason: "bad magic".to_string(),
            });
        }
        Ok(Self { path, mmap })
    }

    pub fn write(&mut self, header: &FrameSlotHeader) -> Result<(), FrameError> {
        header.validate()?;
        let seq = self.seq().load(Ordering::Relaxed);
        let odd = seq | 1;
        self.seq().store(odd, Ordering::Relaxed);
        fence(Ordering::Release);
        header.encode_into(&mut self.mmap[HEADER..HEADER + FrameSlotHeader::SIZE])?;
        self.seq().store(odd + 1, Ordering::Release);
        Ok(())
    }

    /// Reads the header.  An all-zero mapping decodes as an empty frame.
    pub fn read(&self) -> Result<FrameSlotHeader, FrameError> {
        for _ in 0..MAX_READ_ATTEMPTS {
            let before = self.seq().load(Ordering::Acquire);
            if before & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let mut copy = [0u8; FrameSlotHeader::SIZE];
            copy.copy_from_slice(&self.mmap[HEADER..HEADER + FrameSlotHeader::SIZE]);
            fence(Ordering::Acquire);
            if self.seq().load(Ordering::Relaxed) == before {
                return Ok(FrameSlotHeader::decode(&copy)?);
            }
        }
        Err(FrameError::LayoutMismatch {
            path: self.path.clone(),
            reason: "video info is never stable; the writer may have died mid-update".to_string(),
        })
    }

    fn seq(&self) -> &AtomicU64 {
        // SAFETY: offset 8 inside a page-aligned 64-byte mapping.
        unsafe { &*(self.mmap.as_ptr().add(SEQ) as *const AtomicU64) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_dir::TestDir;
    use cgt_core::layout::FrameKind;

    #[test]
    fn test_header_written_by_producer_is_read_by_consumer() {
        let dir = TestDir::new();
        let mut producer = VideoInfoRegion::create(dir.path(), "info").unwrap();
        let consumer = VideoInfoRegion::open(dir.path(), "info").unwrap();
        let header = FrameSlotHeader {
            timestamp: 10,
            frame_kind: FrameKind::Texture,
            width: 2560,
            height: 1440,
            pixel_format: 87,
            window_handle: 0x3_0042,
        };

        producer.write(&header).unwrap();

        assert_eq!(consumer.read().unwrap(), header);
    }

    #[test]
    fn test_fresh_mapping_reads_as_empty_frame() {
        let dir = TestDir::new();
        let region = VideoInfoRegion::create(dir.path(), "info").unwrap();
        assert_eq!(region.read().unwrap(), FrameSlotHeader::default());
    }

    #[test]
    fn test_invalid_header_is_not_written() {
        let dir = TestDir::new();
        let mut region = VideoInfoRegion::create(dir.path(), "info").unwrap();
        let bad = FrameSlotHeader {
            frame_kind: FrameKind::Yuv,
            ..Default::default()
        };
        assert!(region.write(&bad).is_err());
        assert_eq!(region.read().unwrap(), FrameSlotHeader::default());
    }
}
