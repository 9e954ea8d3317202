//! Index table slots and sector arithmetic.
//!
//! The first sector of the chunk file is an index of 1024 four-byte slots,
//! one per chunk of a 32×32 grid. Each slot is a one-byte sector count
//! followed by a little-endian 24-bit sector offset.

use byteorder::{ByteOrder, LittleEndian};

/// Size of one allocation unit in the chunk file.
pub const SECTOR_BYTES: usize = 4096;

/// Number of slots in the index table.
pub const SLOT_COUNT: usize = 1024;

/// Size of one encoded slot.
pub const SLOT_BYTES: usize = 4;

/// Size of the index table (exactly one sector).
pub const INDEX_TABLE_BYTES: usize = SLOT_COUNT * SLOT_BYTES;

/// First sector available for chunk records; sector 0 holds the index.
pub const FIRST_DATA_SECTOR: u32 = 1;

/// Largest offset a slot can encode.
pub const MAX_SECTOR_OFFSET: u32 = 0x00FF_FFFF;

/// Chunks per side of the addressable grid.
pub const REGION_WIDTH: i32 = 32;

/// A decoded index slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotEntry {
    /// Number of sectors the record spans.
    pub sector_count: u8,
    /// Sector at which the record starts.
    pub sector_offset: u32,
}

impl SlotEntry {
    /// The "no chunk stored" slot.
    pub const EMPTY: Self = Self {
        sector_count: 0,
        sector_offset: 0,
    };

    /// Decodes a slot from its four on-disk bytes.
    pub fn decode(bytes: [u8; SLOT_BYTES]) -> Self {
        Self {
            sector_count: bytes[0],
            sector_offset: LittleEndian::read_u24(&bytes[1..]),
        }
    }

    /// Encodes the slot to its four on-disk bytes.
    pub fn encode(&self) -> [u8; SLOT_BYTES] {
        debug_assert!(self.sector_offset <= MAX_SECTOR_OFFSET);
        let mut bytes = [0u8; SLOT_BYTES];
        bytes[0] = self.sector_count;
        LittleEndian::write_u24(&mut bytes[1..], self.sector_offset);
        bytes
    }

    /// Both fields zero: nothing stored here.
    pub fn is_empty(&self) -> bool {
        self.sector_count == 0 && self.sector_offset == 0
    }

    /// Exactly one field zero. Such a slot cannot describe a record.
    pub fn is_malformed(&self) -> bool {
        (self.sector_count == 0) != (self.sector_offset == 0)
    }

    /// Byte position of the record in the chunk file.
    pub fn byte_offset(&self) -> usize {
        self.sector_offset as usize * SECTOR_BYTES
    }

    /// Byte length of the sector run, padding included.
    pub fn byte_len(&self) -> usize {
        self.sector_count as usize * SECTOR_BYTES
    }
}

/// Byte position of the slot for chunk `(x, z)` within the index table.
///
/// Only the low five bits of each coordinate are used, so chunks 32 apart
/// share a slot.
pub fn slot_index(x: i32, z: i32) -> usize {
    SLOT_BYTES * ((x & (REGION_WIDTH - 1)) + (z & (REGION_WIDTH - 1)) * REGION_WIDTH) as usize
}

/// Grid coordinates in `0..32` for slot number `slot`.
pub fn slot_coords(slot: usize) -> (i32, i32) {
    let slot = slot as i32;
    (slot % REGION_WIDTH, slot / REGION_WIDTH)
}

/// Smallest number of whole sectors that holds `len` bytes.
pub fn sectors_for(len: usize) -> usize {
    len.div_ceil(SECTOR_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_formula() {
        assert_eq!(slot_index(0, 0), 0);
        assert_eq!(slot_index(1, 0), 4);
        assert_eq!(slot_index(0, 1), 128);
        assert_eq!(slot_index(31, 31), INDEX_TABLE_BYTES - SLOT_BYTES);
    }

    #[test]
    fn test_slot_index_wraps() {
        assert_eq!(slot_index(32, 0), slot_index(0, 0));
        assert_eq!(slot_index(5, 70), slot_index(5, 6));
        assert_eq!(slot_index(-1, 0), slot_index(31, 0));
        assert_eq!(slot_index(-33, -1), slot_index(31, 31));
    }

    #[test]
    fn test_slot_coords_inverts_slot_index() {
        for slot in [0usize, 1, 31, 32, 500, 1023] {
            let (x, z) = slot_coords(slot);
            assert_eq!(slot_index(x, z), slot * SLOT_BYTES);
        }
    }

    #[test]
    fn test_slot_encoding() {
        let entry = SlotEntry {
            sector_count: 21,
            sector_offset: 0x01_0203,
        };
        assert_eq!(entry.encode(), [21, 0x03, 0x02, 0x01]);
        assert_eq!(SlotEntry::decode([21, 0x03, 0x02, 0x01]), entry);
        assert_eq!(entry.byte_offset(), 0x01_0203 * 4096);
        assert_eq!(entry.byte_len(), 21 * 4096);
    }

    #[test]
    fn test_empty_and_malformed() {
        assert!(SlotEntry::EMPTY.is_empty());
        assert!(!SlotEntry::EMPTY.is_malformed());
        let half = SlotEntry {
            sector_count: 0,
            sector_offset: 4,
        };
        assert!(!half.is_empty());
        assert!(half.is_malformed());
    }

    #[test]
    fn test_sectors_for() {
        assert_eq!(sectors_for(1), 1);
        assert_eq!(sectors_for(4096), 1);
        assert_eq!(sectors_for(4097), 2);
        assert_eq!(sectors_for(4 + 82176), 21);
    }
}
