//! Dense chunk storage with nibble-packed metadata and light planes, plus
//! the persisted and network byte encodings.

pub mod chunk;
pub mod chunk_serial;
pub mod nibble;

pub use chunk::{
    BIOMES_LEN, BLOCKS_LEN, CHUNK_AREA, CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH, Chunk, ChunkError,
    NIBBLE_PLANE_LEN, RawChunkArrays,
};
pub use chunk_serial::{COLUMN_MARKER, NETWORK_PACKED_LEN, SERIALIZED_LEN};
pub use nibble::NibbleArray;
