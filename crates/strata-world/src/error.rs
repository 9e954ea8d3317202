//! Error types for the region store and its sibling files.

use std::path::PathBuf;

use strata_voxel::ChunkError;

use crate::slot::SlotEntry;
use crate::tag::TagError;

/// Errors returned by [`RegionStore`](crate::RegionStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// The filesystem refused an open, read, write, or seek.
    #[error("region I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A chunk record (or the index pointing at it) could not be read back.
    #[error("corrupt chunk record for ({x}, {z}): {fault}")]
    CorruptChunkRecord {
        /// Chunk x coordinate the record was requested for.
        x: i32,
        /// Chunk z coordinate the record was requested for.
        z: i32,
        /// What was wrong with it.
        #[source]
        fault: RecordFault,
    },

    /// An index slot has exactly one of its two fields set to zero.
    #[error("malformed index slot {slot}: {entry:?}")]
    MalformedSlot {
        /// Slot number in `0..1024`.
        slot: usize,
        /// The decoded slot contents.
        entry: SlotEntry,
    },

    /// A sibling metadata file could not be encoded.
    #[error("tag encoding failed: {0}")]
    Tag(#[from] TagError),

    /// A sibling metadata file exists but does not have the expected shape.
    #[error("malformed metadata file {}: {reason}", .path.display())]
    MalformedMetadata {
        /// Offending file.
        path: PathBuf,
        /// Human-readable description.
        reason: String,
    },
}

/// The specific defect found in a chunk record.
#[derive(Debug, thiserror::Error)]
pub enum RecordFault {
    /// The backing file is shorter than the 4096-byte index table.
    #[error("index table truncated at {actual} bytes")]
    ShortIndexTable {
        /// Bytes available.
        actual: usize,
    },
    /// The record runs past the end of the file.
    #[error("record truncated: expected {expected} bytes, got {actual}")]
    ShortRecord {
        /// Bytes the slot or length prefix promised.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// The length prefix is smaller than the prefix itself.
    #[error("invalid record length {0}")]
    BadLength(u32),
    /// The payload was read but does not decode as a chunk.
    #[error("chunk payload rejected: {0}")]
    Decode(#[from] ChunkError),
}
