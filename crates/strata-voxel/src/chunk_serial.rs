//! Byte encodings for [`Chunk`].
//!
//! ## Persisted layout
//!
//! A flat concatenation of the five planes, 82176 bytes in total:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 32768 | Block ids |
//! | 32768 | 16384 | Block metadata (nibbles) |
//! | 49152 | 16384 | Sky light (nibbles) |
//! | 65536 | 16384 | Block light (nibbles) |
//! | 81920 | 256 | Biomes |
//!
//! ## Network layout
//!
//! Columns are visited z-major, x-minor. Each column is a `0xFF` marker
//! followed by eight 16-block sections bottom to top, each section being 16
//! block ids and then the 8 packed metadata bytes covering those blocks.

use crate::chunk::{
    BIOMES_LEN, BLOCKS_LEN, CHUNK_HEIGHT, CHUNK_WIDTH, Chunk, ChunkError, NIBBLE_PLANE_LEN,
};
use crate::nibble::NibbleArray;

const DATA_OFFSET: usize = BLOCKS_LEN;
const SKY_LIGHT_OFFSET: usize = DATA_OFFSET + NIBBLE_PLANE_LEN;
const BLOCK_LIGHT_OFFSET: usize = SKY_LIGHT_OFFSET + NIBBLE_PLANE_LEN;
const BIOMES_OFFSET: usize = BLOCK_LIGHT_OFFSET + NIBBLE_PLANE_LEN;

/// Length of the persisted encoding produced by [`Chunk::serialize`].
pub const SERIALIZED_LEN: usize = BIOMES_OFFSET + BIOMES_LEN;

/// Marker preceding each column in the network encoding.
pub const COLUMN_MARKER: u8 = 0xFF;

/// Height of one vertical section in the network encoding.
const SECTION_HEIGHT: usize = 16;

/// Sections per column in the network encoding.
const SECTIONS_PER_COLUMN: usize = CHUNK_HEIGHT / SECTION_HEIGHT;

/// Bytes per section: block ids plus packed metadata.
const SECTION_LEN: usize = SECTION_HEIGHT + SECTION_HEIGHT / 2;

/// Length of the network encoding produced by [`Chunk::network_pack`].
pub const NETWORK_PACKED_LEN: usize =
    CHUNK_WIDTH * CHUNK_WIDTH * (1 + SECTIONS_PER_COLUMN * SECTION_LEN);

impl Chunk {
    /// Encodes the chunk to its persisted byte layout.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SERIALIZED_LEN);
        buf.extend_from_slice(&self.blocks);
        buf.extend_from_slice(self.data.as_bytes());
        buf.extend_from_slice(self.sky_light.as_bytes());
        buf.extend_from_slice(self.block_light.as_bytes());
        buf.extend_from_slice(&self.biomes);
        buf
    }

    /// Decodes a chunk at grid position `(x, z)` from its persisted layout.
    ///
    /// Bytes past [`SERIALIZED_LEN`] are ignored.
    pub fn deserialize(x: i32, z: i32, bytes: &[u8]) -> Result<Self, ChunkError> {
        if bytes.len() < SERIALIZED_LEN {
            return Err(ChunkError::Truncated {
                expected: SERIALIZED_LEN,
                actual: bytes.len(),
            });
        }

        let plane = |offset: usize, len: usize| bytes[offset..offset + len].to_vec();

        Ok(Self {
            x,
            z,
            blocks: plane(0, BLOCKS_LEN),
            data: NibbleArray::from_bytes(plane(DATA_OFFSET, NIBBLE_PLANE_LEN)),
            sky_light: NibbleArray::from_bytes(plane(SKY_LIGHT_OFFSET, NIBBLE_PLANE_LEN)),
            block_light: NibbleArray::from_bytes(plane(BLOCK_LIGHT_OFFSET, NIBBLE_PLANE_LEN)),
            biomes: plane(BIOMES_OFFSET, BIOMES_LEN),
        })
    }

    /// Encodes block ids and metadata in the column-major network layout.
    pub fn network_pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(NETWORK_PACKED_LEN);
        let data = self.data.as_bytes();

        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                buf.push(COLUMN_MARKER);
                for section in 0..SECTIONS_PER_COLUMN {
                    // Sections never cross a column, so the block run is contiguous.
                    let start = (x << 11) + (z << 7) + section * SECTION_HEIGHT;
                    buf.extend_from_slice(&self.blocks[start..start + SECTION_HEIGHT]);
                    let half = start >> 1;
                    buf.extend_from_slice(&data[half..half + SECTION_HEIGHT / 2]);
                }
            }
        }

        buf
    }
}
