//! Sector-indexed chunk file for a 32×32 grid of chunks.
//!
//! `chunks.dat` starts with a one-sector index table (see [`crate::slot`]),
//! followed by sector-aligned chunk records. A record is a little-endian
//! `u32` total length (prefix included) and the persisted chunk bytes,
//! zero-padded to a whole number of sectors.
//!
//! Writes rebuild the whole file: every live record is copied into a fresh
//! image in slot order, packed from sector 1 upward, and the image replaces
//! the file in one write. There is no free list; the file is always compact.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use strata_voxel::{Chunk, SERIALIZED_LEN};

use crate::error::{RecordFault, RegionError};
use crate::level::{self, LevelOptions};
use crate::slot::{
    FIRST_DATA_SECTOR, INDEX_TABLE_BYTES, MAX_SECTOR_OFFSET, SECTOR_BYTES, SLOT_BYTES,
    SlotEntry, sectors_for, slot_coords, slot_index,
};

/// File holding the index table and chunk records.
pub const CHUNKS_FILE: &str = "chunks.dat";

/// File holding world options.
pub const LEVEL_FILE: &str = "level.dat";

/// File holding entity lists.
pub const ENTITIES_FILE: &str = "entities.dat";

/// Size of the record length prefix.
pub const RECORD_PREFIX_BYTES: usize = 4;

/// Chunk storage rooted at a world directory.
///
/// Every call opens and closes the backing file; nothing is cached and no
/// lock is taken. Two writers on the same directory, or a reader racing a
/// writer, can observe or produce a torn file. Callers must serialise access,
/// for example by keeping a single owner of the store.
#[derive(Debug, Clone)]
pub struct RegionStore {
    world_dir: PathBuf,
    chunks_path: PathBuf,
    level_path: PathBuf,
    entities_path: PathBuf,
}

impl RegionStore {
    /// Opens the world at `world_dir`, creating it with default options if needed.
    pub fn open(world_dir: impl AsRef<Path>) -> Result<Self, RegionError> {
        Self::open_with(world_dir, &LevelOptions::default())
    }

    /// Opens the world at `world_dir`.
    ///
    /// Creates the directory, `level.dat` (from `options`), `entities.dat`
    /// and an empty `chunks.dat` if they are missing. Existing files are left
    /// untouched.
    pub fn open_with(
        world_dir: impl AsRef<Path>,
        options: &LevelOptions,
    ) -> Result<Self, RegionError> {
        let world_dir = std::path::absolute(world_dir.as_ref())?;
        if !world_dir.is_dir() {
            fs::create_dir_all(&world_dir)?;
            tracing::debug!("Created world directory {}", world_dir.display());
        }

        let store = Self {
            chunks_path: world_dir.join(CHUNKS_FILE),
            level_path: world_dir.join(LEVEL_FILE),
            entities_path: world_dir.join(ENTITIES_FILE),
            world_dir,
        };

        if !store.level_path.is_file() {
            fs::write(&store.level_path, level::encode_level_file(options)?)?;
            tracing::debug!("Created {}", store.level_path.display());
        }
        if !store.entities_path.is_file() {
            fs::write(&store.entities_path, level::encode_entities_file()?)?;
            tracing::debug!("Created {}", store.entities_path.display());
        }
        if !store.chunks_path.is_file() {
            fs::write(&store.chunks_path, vec![0u8; INDEX_TABLE_BYTES])?;
            tracing::debug!("Created {}", store.chunks_path.display());
        }

        Ok(store)
    }

    /// Absolute path of the world directory.
    pub fn world_dir(&self) -> &Path {
        &self.world_dir
    }

    pub fn chunks_path(&self) -> &Path {
        &self.chunks_path
    }

    pub fn level_path(&self) -> &Path {
        &self.level_path
    }

    pub fn entities_path(&self) -> &Path {
        &self.entities_path
    }

    /// Loads the chunk at `(x, z)`.
    ///
    /// An empty slot yields a fresh default chunk. Coordinates alias every 32
    /// chunks, and the returned chunk carries the requested coordinates.
    pub fn get_chunk(&self, x: i32, z: i32) -> Result<Chunk, RegionError> {
        let corrupt = |fault| RegionError::CorruptChunkRecord { x, z, fault };
        let mut file = File::open(&self.chunks_path)?;

        let position = slot_index(x, z);
        file.seek(SeekFrom::Start(position as u64))?;
        let mut raw = [0u8; SLOT_BYTES];
        let got = read_up_to(&mut file, &mut raw)?;
        if got < SLOT_BYTES {
            return Err(corrupt(RecordFault::ShortIndexTable {
                actual: position + got,
            }));
        }

        let entry = SlotEntry::decode(raw);
        if entry.is_empty() {
            return Ok(Chunk::new(x, z));
        }
        if entry.is_malformed() {
            return Err(RegionError::MalformedSlot {
                slot: position / SLOT_BYTES,
                entry,
            });
        }

        file.seek(SeekFrom::Start(entry.byte_offset() as u64))?;
        let mut prefix = [0u8; RECORD_PREFIX_BYTES];
        let got = read_up_to(&mut file, &mut prefix)?;
        if got < RECORD_PREFIX_BYTES {
            return Err(corrupt(RecordFault::ShortRecord {
                expected: RECORD_PREFIX_BYTES,
                actual: got,
            }));
        }
        let length = LittleEndian::read_u32(&prefix);
        let Some(payload_len) = (length as usize).checked_sub(RECORD_PREFIX_BYTES) else {
            return Err(corrupt(RecordFault::BadLength(length)));
        };

        let mut payload = Vec::with_capacity(payload_len.min(SERIALIZED_LEN));
        let got = (&mut file).take(payload_len as u64).read_to_end(&mut payload)?;
        if got < payload_len {
            return Err(corrupt(RecordFault::ShortRecord {
                expected: payload_len,
                actual: got,
            }));
        }

        Chunk::deserialize(x, z, &payload).map_err(|e| corrupt(RecordFault::Decode(e)))
    }

    /// Stores `chunk` in the slot for its coordinates, rewriting the whole file.
    ///
    /// The replacement image is fully assembled in memory before the file is
    /// touched. A failure during the final write can still leave the file
    /// partially written.
    pub fn set_chunk(&self, chunk: &Chunk) -> Result<(), RegionError> {
        let record = encode_record(chunk)?;
        let old = fs::read(&self.chunks_path)?;
        let image = rebuild_image(&old, chunk.x(), chunk.z(), &record)?;
        fs::write(&self.chunks_path, &image)?;
        tracing::debug!(
            "Wrote chunk ({}, {}); region file now {} sectors",
            chunk.x(),
            chunk.z(),
            image.len() / SECTOR_BYTES
        );
        Ok(())
    }

    /// Reads all 1024 index slots.
    pub fn slots(&self) -> Result<Vec<SlotEntry>, RegionError> {
        let mut file = File::open(&self.chunks_path)?;
        let mut table = vec![0u8; INDEX_TABLE_BYTES];
        let got = read_up_to(&mut file, &mut table)?;
        if got < INDEX_TABLE_BYTES {
            return Err(RegionError::CorruptChunkRecord {
                x: 0,
                z: 0,
                fault: RecordFault::ShortIndexTable { actual: got },
            });
        }
        Ok(table.chunks_exact(SLOT_BYTES).map(decode_slot).collect())
    }

    /// Whether the slot that `(x, z)` maps to holds a record.
    pub fn contains_chunk(&self, x: i32, z: i32) -> Result<bool, RegionError> {
        let slot = slot_index(x, z) / SLOT_BYTES;
        Ok(!self.slots()?[slot].is_empty())
    }

    /// Reads the world options back from `level.dat`.
    pub fn level_options(&self) -> Result<LevelOptions, RegionError> {
        let bytes = fs::read(&self.level_path)?;
        level::decode_level_file(&bytes)?.ok_or_else(|| RegionError::MalformedMetadata {
            path: self.level_path.clone(),
            reason: "header length overruns file".to_string(),
        })
    }
}

/// Builds the sector-padded record for `chunk`.
pub fn encode_record(chunk: &Chunk) -> Result<Vec<u8>, RegionError> {
    let payload = chunk.serialize();
    let total = RECORD_PREFIX_BYTES + payload.len();
    let padded = sectors_for(total) * SECTOR_BYTES;

    let mut record = Vec::with_capacity(padded);
    record.write_u32::<LittleEndian>(total as u32)?;
    record.extend_from_slice(&payload);
    record.resize(padded, 0);
    Ok(record)
}

/// Produces the replacement chunk file with `record` stored for `(x, z)`.
///
/// Slots are visited in ascending order. Each live record is copied verbatim
/// (sector count unchanged) to the next free sector, starting at sector 1.
fn rebuild_image(old: &[u8], x: i32, z: i32, record: &[u8]) -> Result<Vec<u8>, RegionError> {
    if old.len() < INDEX_TABLE_BYTES {
        return Err(RegionError::CorruptChunkRecord {
            x,
            z,
            fault: RecordFault::ShortIndexTable { actual: old.len() },
        });
    }

    let target = slot_index(x, z) / SLOT_BYTES;
    let record_sectors = u8::try_from(record.len() / SECTOR_BYTES).map_err(|_| {
        RegionError::CorruptChunkRecord {
            x,
            z,
            fault: RecordFault::BadLength(record.len() as u32),
        }
    })?;

    let mut index = Vec::with_capacity(INDEX_TABLE_BYTES);
    let mut body = Vec::with_capacity(old.len().saturating_sub(INDEX_TABLE_BYTES) + record.len());
    let mut next_sector = FIRST_DATA_SECTOR;

    for (slot, raw) in old[..INDEX_TABLE_BYTES].chunks_exact(SLOT_BYTES).enumerate() {
        let (sector_count, bytes) = if slot == target {
            (record_sectors, record)
        } else {
            let entry = decode_slot(raw);
            if entry.is_empty() {
                index.extend_from_slice(&SlotEntry::EMPTY.encode());
                continue;
            }
            if entry.is_malformed() {
                return Err(RegionError::MalformedSlot { slot, entry });
            }
            let start = entry.byte_offset();
            let Some(bytes) = old.get(start..start + entry.byte_len()) else {
                let (sx, sz) = slot_coords(slot);
                return Err(RegionError::CorruptChunkRecord {
                    x: sx,
                    z: sz,
                    fault: RecordFault::ShortRecord {
                        expected: entry.byte_len(),
                        actual: old.len().saturating_sub(start),
                    },
                });
            };
            tracing::trace!(
                "Relocating slot {} from sector {} to {}",
                slot,
                entry.sector_offset,
                next_sector
            );
            (entry.sector_count, bytes)
        };

        debug_assert!(next_sector <= MAX_SECTOR_OFFSET);
        let entry = SlotEntry {
            sector_count,
            sector_offset: next_sector,
        };
        index.extend_from_slice(&entry.encode());
        body.extend_from_slice(bytes);
        next_sector += u32::from(sector_count);
    }

    index.extend_from_slice(&body);
    Ok(index)
}

fn decode_slot(raw: &[u8]) -> SlotEntry {
    SlotEntry::decode([raw[0], raw[1], raw[2], raw[3]])
}

/// Reads until `buf` is full or EOF, returning the number of bytes read.
fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk(x: i32, z: i32, seed: u8) -> Chunk {
        let mut chunk = Chunk::new(x, z);
        for i in 0..16usize {
            let y = (i * 7 + seed as usize) % 128;
            chunk.set_block(i, y, 15 - i, seed.wrapping_add(i as u8)).unwrap();
            chunk.set_data(i, y, i, (seed as usize + i) as u8 % 16).unwrap();
            chunk.set_block_light(i, 3, i, 12).unwrap();
            chunk.set_sky_light(i, 100, 0, 2).unwrap();
            chunk.set_biome(i, i, seed).unwrap();
        }
        chunk
    }

    fn file_len(store: &RegionStore) -> u64 {
        fs::metadata(store.chunks_path()).unwrap().len()
    }

    #[test]
    fn test_open_creates_world_files() {
        let dir = tempfile::tempdir().unwrap();
        let world = dir.path().join("nested").join("world");
        let store = RegionStore::open(&world).unwrap();

        assert!(world.is_dir());
        assert_eq!(fs::read(store.chunks_path()).unwrap(), vec![0u8; 4096]);
        assert!(store.level_path().is_file());
        assert_eq!(&fs::read(store.entities_path()).unwrap()[0..4], b"ENT\0");
        assert!(store.world_dir().is_absolute());
    }

    #[test]
    fn test_open_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        store.set_chunk(&sample_chunk(2, 3, 9)).unwrap();
        fs::write(store.level_path(), b"custom").unwrap();

        let reopened = RegionStore::open(dir.path()).unwrap();
        assert_eq!(fs::read(reopened.level_path()).unwrap(), b"custom");
        assert_eq!(reopened.get_chunk(2, 3).unwrap(), sample_chunk(2, 3, 9));
    }

    #[test]
    fn test_unwritten_chunk_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let chunk = store.get_chunk(5, -7).unwrap();
        assert_eq!(chunk, Chunk::new(5, -7));
        assert_eq!(chunk.get_sky_light(0, 0, 0), Ok(15));
    }

    #[test]
    fn test_set_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let chunk = sample_chunk(4, 1, 77);
        store.set_chunk(&chunk).unwrap();
        assert_eq!(store.get_chunk(4, 1).unwrap(), chunk);
    }

    #[test]
    fn test_roundtrip_survives_unrelated_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let chunk = sample_chunk(10, 10, 1);
        store.set_chunk(&chunk).unwrap();
        for (i, (x, z)) in [(0, 0), (31, 31), (9, 10), (11, 10)].into_iter().enumerate() {
            store.set_chunk(&sample_chunk(x, z, 50 + i as u8)).unwrap();
        }
        assert_eq!(store.get_chunk(10, 10).unwrap(), chunk);
        assert_eq!(store.get_chunk(31, 31).unwrap(), sample_chunk(31, 31, 51));
    }

    #[test]
    fn test_coordinates_alias_every_32() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let chunk = sample_chunk(3, 4, 12);
        store.set_chunk(&chunk).unwrap();

        let aliased = store.get_chunk(3 + 32, 4).unwrap();
        assert_eq!((aliased.x(), aliased.z()), (35, 4));
        assert_eq!(aliased.serialize(), chunk.serialize());

        store.set_chunk(&sample_chunk(3, 4 - 32, 13)).unwrap();
        assert_eq!(
            store.get_chunk(3, 4).unwrap().serialize(),
            sample_chunk(3, 4, 13).serialize()
        );
        assert_eq!(file_len(&store), 4096 + 21 * 4096);
    }

    #[test]
    fn test_many_chunks_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let coords: Vec<(i32, i32)> = (0..24).map(|i| ((i * 5) % 32, (i * 11) % 32)).collect();

        for (i, &(x, z)) in coords.iter().enumerate() {
            store.set_chunk(&sample_chunk(x, z, i as u8)).unwrap();
            let len = file_len(&store);
            assert!(len > 0 && len % 4096 == 0);
        }
        for (i, &(x, z)) in coords.iter().enumerate() {
            assert_eq!(store.get_chunk(x, z).unwrap(), sample_chunk(x, z, i as u8));
        }
        assert_eq!(file_len(&store), 4096 + 24 * 21 * 4096);
    }

    #[test]
    fn test_rewriting_a_chunk_does_not_grow_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        store.set_chunk(&sample_chunk(0, 0, 1)).unwrap();
        store.set_chunk(&sample_chunk(1, 0, 2)).unwrap();
        let len = file_len(&store);
        store.set_chunk(&sample_chunk(0, 0, 3)).unwrap();
        assert_eq!(file_len(&store), len);
        assert_eq!(store.get_chunk(0, 0).unwrap(), sample_chunk(0, 0, 3));
        assert_eq!(store.get_chunk(1, 0).unwrap(), sample_chunk(1, 0, 2));
    }

    #[test]
    fn test_records_are_packed_in_slot_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        store.set_chunk(&sample_chunk(1, 0, 1)).unwrap();
        assert_eq!(store.slots().unwrap()[1].sector_offset, 1);

        // Slot 0 sorts first, so slot 1 is relocated behind it.
        store.set_chunk(&sample_chunk(0, 0, 2)).unwrap();
        let slots = store.slots().unwrap();
        assert_eq!(
            slots[0],
            SlotEntry {
                sector_count: 21,
                sector_offset: 1
            }
        );
        assert_eq!(
            slots[1],
            SlotEntry {
                sector_count: 21,
                sector_offset: 22
            }
        );
        assert!(slots[2..].iter().all(SlotEntry::is_empty));

        let bytes = fs::read(store.chunks_path()).unwrap();
        let record_start = 4096;
        assert_eq!(
            LittleEndian::read_u32(&bytes[record_start..record_start + 4]) as usize,
            4 + strata_voxel::SERIALIZED_LEN
        );
        assert!(store.contains_chunk(1, 0).unwrap());
        assert!(!store.contains_chunk(2, 0).unwrap());
    }

    #[test]
    fn test_encode_record_padding() {
        let record = encode_record(&Chunk::new(0, 0)).unwrap();
        assert_eq!(record.len(), 21 * 4096);
        assert_eq!(
            LittleEndian::read_u32(&record[..4]) as usize,
            4 + strata_voxel::SERIALIZED_LEN
        );
        assert!(record[4 + strata_voxel::SERIALIZED_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_truncated_record_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        store.set_chunk(&sample_chunk(0, 0, 1)).unwrap();
        let bytes = fs::read(store.chunks_path()).unwrap();
        fs::write(store.chunks_path(), &bytes[..4096 + 1000]).unwrap();

        let err = store.get_chunk(0, 0).unwrap_err();
        assert!(matches!(
            err,
            RegionError::CorruptChunkRecord {
                x: 0,
                z: 0,
                fault: RecordFault::ShortRecord { .. }
            }
        ));
    }

    #[test]
    fn test_slot_past_eof_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let mut bytes = fs::read(store.chunks_path()).unwrap();
        bytes[..4].copy_from_slice(&[1, 9, 0, 0]);
        fs::write(store.chunks_path(), &bytes).unwrap();

        assert!(matches!(
            store.get_chunk(0, 0),
            Err(RegionError::CorruptChunkRecord { .. })
        ));
    }

    #[test]
    fn test_bad_length_prefix_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let mut bytes = vec![0u8; 2 * 4096];
        bytes[..4].copy_from_slice(&[1, 1, 0, 0]);
        bytes[4096..4100].copy_from_slice(&2u32.to_le_bytes());
        fs::write(store.chunks_path(), &bytes).unwrap();

        assert!(matches!(
            store.get_chunk(0, 0),
            Err(RegionError::CorruptChunkRecord {
                fault: RecordFault::BadLength(2),
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_length_prefix_reports_short_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let mut bytes = vec![0u8; 2 * 4096];
        bytes[..4].copy_from_slice(&[1, 1, 0, 0]);
        bytes[4096..4100].copy_from_slice(&u32::MAX.to_le_bytes());
        fs::write(store.chunks_path(), &bytes).unwrap();

        match store.get_chunk(0, 0) {
            Err(RegionError::CorruptChunkRecord {
                fault: RecordFault::ShortRecord { expected, actual },
                ..
            }) => {
                assert_eq!(expected, u32::MAX as usize - 4);
                assert_eq!(actual, 4092);
            }
            other => panic!("expected short record, got {other:?}"),
        }
    }

    #[test]
    fn test_short_payload_fails_decode() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let mut bytes = vec![0u8; 2 * 4096];
        bytes[..4].copy_from_slice(&[1, 1, 0, 0]);
        bytes[4096..4100].copy_from_slice(&100u32.to_le_bytes());
        fs::write(store.chunks_path(), &bytes).unwrap();

        assert!(matches!(
            store.get_chunk(0, 0),
            Err(RegionError::CorruptChunkRecord {
                fault: RecordFault::Decode(_),
                ..
            })
        ));
    }

    #[test]
    fn test_failed_rebuild_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let mut bytes = fs::read(store.chunks_path()).unwrap();
        // Slot 5 claims a record far past EOF.
        bytes[20..24].copy_from_slice(&[21, 40, 0, 0]);
        fs::write(store.chunks_path(), &bytes).unwrap();

        let err = store.set_chunk(&sample_chunk(0, 0, 1)).unwrap_err();
        assert!(matches!(
            err,
            RegionError::CorruptChunkRecord { x: 5, z: 0, .. }
        ));
        assert_eq!(fs::read(store.chunks_path()).unwrap(), bytes);
    }

    #[test]
    fn test_malformed_slot_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let mut bytes = fs::read(store.chunks_path()).unwrap();
        bytes[4..8].copy_from_slice(&[0, 3, 0, 0]);
        fs::write(store.chunks_path(), &bytes).unwrap();

        assert!(matches!(
            store.get_chunk(1, 0),
            Err(RegionError::MalformedSlot { slot: 1, .. })
        ));
        assert!(matches!(
            store.set_chunk(&Chunk::new(0, 0)),
            Err(RegionError::MalformedSlot { slot: 1, .. })
        ));
    }

    #[test]
    fn test_short_index_table_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        fs::write(store.chunks_path(), [0u8; 10]).unwrap();

        assert!(matches!(
            store.get_chunk(3, 3),
            Err(RegionError::CorruptChunkRecord {
                fault: RecordFault::ShortIndexTable { .. },
                ..
            })
        ));
        assert!(store.set_chunk(&Chunk::new(0, 0)).is_err());
    }

    #[test]
    fn test_level_options_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let options = LevelOptions {
            level_name: "archipelago".to_string(),
            seed: Some(42),
            game_type: 1,
            ..LevelOptions::default()
        };
        let store = RegionStore::open_with(dir.path(), &options).unwrap();
        assert_eq!(store.level_options().unwrap(), options);
    }

    #[test]
    fn test_missing_chunk_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        fs::remove_file(store.chunks_path()).unwrap();
        assert!(matches!(store.get_chunk(0, 0), Err(RegionError::Io(_))));
    }
}
