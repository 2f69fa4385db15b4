//! Frame slot allocation and stream lifecycle, independent of the OS region.

pub mod ring;
pub mod state;

pub use ring::{slot_count, KindRing, SlotIndex, SlotRing, NUMBER_OF_SHARED_FRAMES};
pub use state::{StateError, StreamSignal, StreamState};
