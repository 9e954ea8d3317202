//! World directory storage: a sector-indexed chunk file for a 32×32 chunk
//! grid, plus the `level.dat` and `entities.dat` sibling files.

pub mod error;
pub mod level;
pub mod region;
pub mod slot;
pub mod tag;

pub use error::{RecordFault, RegionError};
pub use level::LevelOptions;
pub use region::RegionStore;
pub use slot::{SECTOR_BYTES, SLOT_COUNT, SlotEntry, slot_coords, slot_index};
pub use tag::{Tag, TagError};
