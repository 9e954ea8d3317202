//! Subcommand implementations. Each returns the text to print.

use std::fmt::Write as _;
use std::fs;

use strata_config::Command;
use strata_voxel::{CHUNK_HEIGHT, CHUNK_WIDTH, Chunk, ChunkError};
use strata_world::{RegionError, RegionStore, SECTOR_BYTES, slot_coords};

/// Errors surfaced by a subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The region store failed.
    #[error(transparent)]
    Region(#[from] RegionError),
    /// A chunk edit was rejected.
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a chunk's contents.
#[derive(Debug, PartialEq, Eq)]
pub struct ChunkSummary {
    /// Voxels with a non-zero block id.
    pub solid_blocks: usize,
    /// Highest y holding a non-zero block id, if any.
    pub top_y: Option<usize>,
    /// Biome of column (0, 0).
    pub origin_biome: u8,
}

impl ChunkSummary {
    pub fn of(chunk: &Chunk) -> Self {
        let solid_blocks = chunk.blocks().iter().filter(|&&b| b != 0).count();
        // Block index is x-major with y least significant, so y = index % height.
        let top_y = chunk
            .blocks()
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b != 0)
            .map(|(i, _)| i % CHUNK_HEIGHT)
            .max();
        Self {
            solid_blocks,
            top_y,
            origin_biome: chunk.biomes()[0],
        }
    }
}

pub fn run(store: &RegionStore, command: &Command) -> Result<String, CommandError> {
    match *command {
        Command::Info => info(store),
        Command::Show { x, z } => show(store, x, z),
        Command::Fill {
            x,
            z,
            block,
            height,
        } => fill(store, x, z, block, height),
        Command::Pack { x, z, ref out } => {
            let packed = store.get_chunk(x, z)?.network_pack();
            fs::write(out, &packed)?;
            Ok(format!("wrote {} bytes to {}\n", packed.len(), out.display()))
        }
    }
}

fn info(store: &RegionStore) -> Result<String, CommandError> {
    let len = fs::metadata(store.chunks_path())?.len();
    let slots = store.slots()?;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} bytes ({} sectors)",
        store.chunks_path().display(),
        len,
        len / SECTOR_BYTES as u64
    );
    for (slot, entry) in slots.iter().enumerate().filter(|(_, e)| !e.is_empty()) {
        let (x, z) = slot_coords(slot);
        let _ = writeln!(
            out,
            "{x:>3} {z:>3} sectors={:<3} offset={}",
            entry.sector_count, entry.sector_offset
        );
    }
    Ok(out)
}

fn show(store: &RegionStore, x: i32, z: i32) -> Result<String, CommandError> {
    let summary = ChunkSummary::of(&store.get_chunk(x, z)?);
    let top = summary
        .top_y
        .map_or_else(|| "none".to_string(), |y| y.to_string());
    Ok(format!(
        "chunk ({x}, {z}): {} solid blocks, top y {top}, biome {}\n",
        summary.solid_blocks, summary.origin_biome
    ))
}

fn fill(
    store: &RegionStore,
    x: i32,
    z: i32,
    block: u8,
    height: usize,
) -> Result<String, CommandError> {
    let mut chunk = store.get_chunk(x, z)?;
    let height = height.min(CHUNK_HEIGHT);
    for bx in 0..CHUNK_WIDTH {
        for bz in 0..CHUNK_WIDTH {
            for y in 0..height {
                chunk.set_block(bx, y, bz, block)?;
            }
        }
    }
    store.set_chunk(&chunk)?;
    tracing::debug!("Filled {} layers of chunk ({}, {})", height, x, z);
    Ok(format!("filled chunk ({x}, {z}) up to y {height} with block {block}\n"))
}
