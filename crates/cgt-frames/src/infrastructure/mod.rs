//! OS-facing building blocks: mapped regions and named events.

pub mod info_region;
pub mod named_event;
pub mod shared_region;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_dir;
