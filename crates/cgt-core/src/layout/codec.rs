//! Little-endian field helpers shared by the layout structs.
//!
//! Shared regions are read by processes built from the same workspace on the
//! same machine, but the layout is still spelled out byte by byte so that the
//! producer, the consumer and the driver-side tooling agree without relying
//! on `repr(C)` padding rules.

use super::LayoutError;

pub(crate) fn require_len(buf: &[u8], needed: usize, context: &'static str) -> Result<(), LayoutError> {
    if buf.len() < needed {
        Err(LayoutError::InsufficientData {
            context,
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

pub(crate) fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

pub(crate) fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
