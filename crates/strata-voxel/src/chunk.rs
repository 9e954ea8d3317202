//! Dense storage for one 16×16×128 chunk column.
//!
//! A [`Chunk`] owns five fixed-length planes: one byte per voxel for block
//! ids, three nibble planes (metadata, sky light, block light) and one byte
//! per column for biomes. Voxels are addressed as `(x << 11) + (z << 7) + y`,
//! so `x` is the most significant axis and `y` the least.

use crate::nibble::NibbleArray;

/// Width and depth of a chunk in voxels.
pub const CHUNK_WIDTH: usize = 16;

/// Height of a chunk in voxels.
pub const CHUNK_HEIGHT: usize = 128;

/// Number of voxels in a chunk (16 × 16 × 128).
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_WIDTH * CHUNK_HEIGHT;

/// Number of columns in a chunk (16 × 16).
pub const CHUNK_AREA: usize = CHUNK_WIDTH * CHUNK_WIDTH;

/// Byte length of the block id plane.
pub const BLOCKS_LEN: usize = CHUNK_VOLUME;

/// Byte length of each nibble plane.
pub const NIBBLE_PLANE_LEN: usize = CHUNK_VOLUME / 2;

/// Byte length of the biome plane.
pub const BIOMES_LEN: usize = CHUNK_AREA;

/// Fill byte for a fresh sky light plane (every nibble at 15).
pub const SKY_LIGHT_FILL: u8 = 0xFF;

/// Errors raised by chunk accessors and decoding.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkError {
    /// A voxel coordinate fell outside `x, z < 16`, `y < 128`.
    #[error("voxel coordinate ({x}, {y}, {z}) out of range")]
    VoxelOutOfRange {
        /// Requested x.
        x: usize,
        /// Requested y.
        y: usize,
        /// Requested z.
        z: usize,
    },
    /// A column coordinate fell outside `x, z < 16`.
    #[error("column coordinate ({x}, {z}) out of range")]
    ColumnOutOfRange {
        /// Requested x.
        x: usize,
        /// Requested z.
        z: usize,
    },
    /// A nibble plane setter received a value above 15.
    #[error("nibble value {0} exceeds 15")]
    NibbleOutOfRange(u8),
    /// The persisted buffer is shorter than a full chunk.
    #[error("chunk data truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum expected byte count.
        expected: usize,
        /// Actual byte count received.
        actual: usize,
    },
}

/// Caller-supplied planes for [`Chunk::from_raw`].
///
/// Any plane that is `None` or has the wrong length is replaced by a freshly
/// allocated default plane.
#[derive(Clone, Debug, Default)]
pub struct RawChunkArrays {
    /// Block ids, [`BLOCKS_LEN`] bytes.
    pub blocks: Option<Vec<u8>>,
    /// Packed block metadata, [`NIBBLE_PLANE_LEN`] bytes.
    pub data: Option<Vec<u8>>,
    /// Packed sky light, [`NIBBLE_PLANE_LEN`] bytes.
    pub sky_light: Option<Vec<u8>>,
    /// Packed block light, [`NIBBLE_PLANE_LEN`] bytes.
    pub block_light: Option<Vec<u8>>,
    /// Biome ids, [`BIOMES_LEN`] bytes.
    pub biomes: Option<Vec<u8>>,
}

/// One chunk of voxel data at grid position `(x, z)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub(crate) x: i32,
    pub(crate) z: i32,
    pub(crate) blocks: Vec<u8>,
    pub(crate) data: NibbleArray,
    pub(crate) sky_light: NibbleArray,
    pub(crate) block_light: NibbleArray,
    pub(crate) biomes: Vec<u8>,
}

impl Chunk {
    /// Creates an empty chunk: air everywhere, full sky light, no block light.
    pub fn new(x: i32, z: i32) -> Self {
        Self::from_raw(x, z, RawChunkArrays::default())
    }

    /// Builds a chunk from caller-supplied planes.
    ///
    /// Wrong-length planes are not an error; they are dropped and replaced
    /// by the default for that plane.
    pub fn from_raw(x: i32, z: i32, raw: RawChunkArrays) -> Self {
        let blocks =
            sized_or(raw.blocks, BLOCKS_LEN, "blocks").unwrap_or_else(|| vec![0; BLOCKS_LEN]);
        let data = sized_or(raw.data, NIBBLE_PLANE_LEN, "data")
            .map(NibbleArray::from_bytes)
            .unwrap_or_else(|| NibbleArray::filled(CHUNK_VOLUME, 0));
        let sky_light = sized_or(raw.sky_light, NIBBLE_PLANE_LEN, "sky_light")
            .map(NibbleArray::from_bytes)
            .unwrap_or_else(|| NibbleArray::filled(CHUNK_VOLUME, SKY_LIGHT_FILL));
        let block_light = sized_or(raw.block_light, NIBBLE_PLANE_LEN, "block_light")
            .map(NibbleArray::from_bytes)
            .unwrap_or_else(|| NibbleArray::filled(CHUNK_VOLUME, 0));
        let biomes =
            sized_or(raw.biomes, BIOMES_LEN, "biomes").unwrap_or_else(|| vec![0; BIOMES_LEN]);

        Self {
            x,
            z,
            blocks,
            data,
            sky_light,
            block_light,
            biomes,
        }
    }

    /// Chunk grid x coordinate.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Chunk grid z coordinate.
    pub fn z(&self) -> i32 {
        self.z
    }

    /// Linear voxel index, `x` most significant, then `z`, then `y`.
    pub fn voxel_index(x: usize, y: usize, z: usize) -> Result<usize, ChunkError> {
        if x >= CHUNK_WIDTH || y >= CHUNK_HEIGHT || z >= CHUNK_WIDTH {
            return Err(ChunkError::VoxelOutOfRange { x, y, z });
        }
        Ok((x << 11) + (z << 7) + y)
    }

    /// Linear column index into the biome plane.
    pub fn column_index(x: usize, z: usize) -> Result<usize, ChunkError> {
        if x >= CHUNK_WIDTH || z >= CHUNK_WIDTH {
            return Err(ChunkError::ColumnOutOfRange { x, z });
        }
        Ok((z << 4) + x)
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> Result<u8, ChunkError> {
        Ok(self.blocks[Self::voxel_index(x, y, z)?])
    }

    pub fn set_block(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        block: u8,
    ) -> Result<(), ChunkError> {
        let i = Self::voxel_index(x, y, z)?;
        self.blocks[i] = block;
        Ok(())
    }

    pub fn get_data(&self, x: usize, y: usize, z: usize) -> Result<u8, ChunkError> {
        Ok(self.data.get(Self::voxel_index(x, y, z)?))
    }

    pub fn set_data(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        value: u8,
    ) -> Result<(), ChunkError> {
        set_nibble(&mut self.data, x, y, z, value)
    }

    pub fn get_sky_light(&self, x: usize, y: usize, z: usize) -> Result<u8, ChunkError> {
        Ok(self.sky_light.get(Self::voxel_index(x, y, z)?))
    }

    pub fn set_sky_light(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        level: u8,
    ) -> Result<(), ChunkError> {
        set_nibble(&mut self.sky_light, x, y, z, level)
    }

    pub fn get_block_light(&self, x: usize, y: usize, z: usize) -> Result<u8, ChunkError> {
        Ok(self.block_light.get(Self::voxel_index(x, y, z)?))
    }

    pub fn set_block_light(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        level: u8,
    ) -> Result<(), ChunkError> {
        set_nibble(&mut self.block_light, x, y, z, level)
    }

    pub fn get_biome(&self, x: usize, z: usize) -> Result<u8, ChunkError> {
        Ok(self.biomes[Self::column_index(x, z)?])
    }

    pub fn set_biome(&mut self, x: usize, z: usize, biome: u8) -> Result<(), ChunkError> {
        let i = Self::column_index(x, z)?;
        self.biomes[i] = biome;
        Ok(())
    }

    /// Raw block id plane.
    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    /// Packed block metadata plane.
    pub fn data(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Packed sky light plane.
    pub fn sky_light(&self) -> &[u8] {
        self.sky_light.as_bytes()
    }

    /// Packed block light plane.
    pub fn block_light(&self) -> &[u8] {
        self.block_light.as_bytes()
    }

    /// Biome plane.
    pub fn biomes(&self) -> &[u8] {
        &self.biomes
    }
}

fn set_nibble(
    plane: &mut NibbleArray,
    x: usize,
    y: usize,
    z: usize,
    value: u8,
) -> Result<(), ChunkError> {
    let i = Chunk::voxel_index(x, y, z)?;
    if value > 0x0F {
        return Err(ChunkError::NibbleOutOfRange(value));
    }
    plane.set(i, value);
    Ok(())
}

/// Keeps `plane` only if it has exactly `len` bytes.
fn sized_or(plane: Option<Vec<u8>>, len: usize, name: &str) -> Option<Vec<u8>> {
    match plane {
        Some(bytes) if bytes.len() == len => Some(bytes),
        Some(bytes) => {
            tracing::warn!(
                "Chunk plane `{}` has {} bytes, expected {}; using default",
                name,
                bytes.len(),
                len
            );
            None
        }
        None => None,
    }
}
