//! World options (`level.dat`) and entity (`entities.dat`) sibling files.
//!
//! ## `level.dat`
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Header version (`u32` LE, 3) |
//! | 4 | 4 | Payload length (`u32` LE) |
//! | 8 | N | Root compound tag |
//!
//! ## `entities.dat`
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic `"ENT\0"` |
//! | 4 | 4 | Version (`u32` LE, 1) |
//! | 8 | 4 | Payload length (`u32` LE) |
//! | 12 | N | Root compound with empty `Entities` and `TileEntities` lists |

use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tag::{Tag, TagError};

/// Header version written at the start of `level.dat`.
pub const LEVEL_HEADER_VERSION: u32 = 3;

/// Magic bytes at the start of `entities.dat`.
pub const ENTITIES_MAGIC: [u8; 4] = *b"ENT\0";

/// Version written after the entities magic.
pub const ENTITIES_VERSION: u32 = 1;

const LEVEL_HEADER_LEN: usize = 8;

/// Settings written to `level.dat` when a world is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelOptions {
    /// Display name of the world.
    pub level_name: String,
    /// Game mode id.
    pub game_type: i32,
    /// Platform id.
    pub platform: i32,
    /// Spawn x in blocks.
    pub spawn_x: i32,
    /// Spawn y in blocks.
    pub spawn_y: i32,
    /// Spawn z in blocks.
    pub spawn_z: i32,
    /// Storage format version recorded in the document.
    pub storage_version: i32,
    /// World seed. `None` draws a random non-negative seed at creation.
    pub seed: Option<i64>,
    /// World time in ticks.
    pub time: i64,
    /// Tick at which the day cycle was stopped.
    pub day_cycle_stop_time: i64,
    /// Mob spawning flag.
    pub spawn_mobs: i32,
}

impl Default for LevelOptions {
    fn default() -> Self {
        Self {
            level_name: "world".to_string(),
            game_type: 0,
            platform: 2,
            spawn_x: 256,
            spawn_y: 70,
            spawn_z: 256,
            storage_version: 3,
            seed: None,
            time: 0,
            day_cycle_stop_time: 0,
            spawn_mobs: 0,
        }
    }
}

impl LevelOptions {
    /// Builds the root document. `last_played` is milliseconds since the epoch.
    pub fn to_tag(&self, seed: i64, last_played: i64) -> Tag {
        let entries: [(&str, Tag); 13] = [
            ("GameType", Tag::Int(self.game_type)),
            ("LastPlayed", Tag::Long(last_played)),
            ("LevelName", Tag::String(self.level_name.clone())),
            ("Platform", Tag::Int(self.platform)),
            ("RandomSeed", Tag::Long(seed)),
            ("SizeOnDisk", Tag::Long(0)),
            ("SpawnX", Tag::Int(self.spawn_x)),
            ("SpawnY", Tag::Int(self.spawn_y)),
            ("SpawnZ", Tag::Int(self.spawn_z)),
            ("StorageVersion", Tag::Int(self.storage_version)),
            ("Time", Tag::Long(self.time)),
            ("dayCycleStopTime", Tag::Long(self.day_cycle_stop_time)),
            ("spawnMobs", Tag::Int(self.spawn_mobs)),
        ];
        Tag::Compound(
            entries
                .into_iter()
                .map(|(name, tag)| (name.to_string(), tag))
                .collect(),
        )
    }

    /// Reads options back from a root document. Missing keys keep defaults.
    pub fn from_tag(root: &Tag) -> Self {
        let defaults = Self::default();
        let int = |name: &str, fallback: i32| {
            root.get(name)
                .and_then(Tag::as_i64)
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(fallback)
        };
        let long = |name: &str, fallback: i64| {
            root.get(name).and_then(Tag::as_i64).unwrap_or(fallback)
        };

        Self {
            level_name: root
                .get("LevelName")
                .and_then(Tag::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.level_name),
            game_type: int("GameType", defaults.game_type),
            platform: int("Platform", defaults.platform),
            spawn_x: int("SpawnX", defaults.spawn_x),
            spawn_y: int("SpawnY", defaults.spawn_y),
            spawn_z: int("SpawnZ", defaults.spawn_z),
            storage_version: int("StorageVersion", defaults.storage_version),
            seed: root.get("RandomSeed").and_then(Tag::as_i64),
            time: long("Time", defaults.time),
            day_cycle_stop_time: long("dayCycleStopTime", defaults.day_cycle_stop_time),
            spawn_mobs: int("spawnMobs", defaults.spawn_mobs),
        }
    }

    /// The configured seed, or a fresh random one.
    fn resolve_seed(&self) -> i64 {
        self.seed
            .unwrap_or_else(|| rand::rng().random_range(0..i64::MAX))
    }
}

/// Encodes a complete `level.dat` image.
pub fn encode_level_file(options: &LevelOptions) -> Result<Vec<u8>, TagError> {
    let last_played = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    let payload = options
        .to_tag(options.resolve_seed(), last_played)
        .to_root_bytes()?;

    let mut buf = Vec::with_capacity(LEVEL_HEADER_LEN + payload.len());
    buf.write_u32::<LittleEndian>(LEVEL_HEADER_VERSION)?;
    buf.write_u32::<LittleEndian>(payload_len(&payload)?)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes a `level.dat` image.
///
/// Returns `Ok(None)` if the header is short or its length field overruns
/// the buffer.
pub fn decode_level_file(bytes: &[u8]) -> Result<Option<LevelOptions>, TagError> {
    if bytes.len() < LEVEL_HEADER_LEN {
        return Ok(None);
    }
    let len = LittleEndian::read_u32(&bytes[4..8]) as usize;
    let Some(mut payload) = bytes.get(LEVEL_HEADER_LEN..LEVEL_HEADER_LEN + len) else {
        return Ok(None);
    };
    let (_, root) = Tag::read_root(&mut payload)?;
    Ok(Some(LevelOptions::from_tag(&root)))
}

/// Encodes a fresh `entities.dat` image holding no entities.
pub fn encode_entities_file() -> Result<Vec<u8>, TagError> {
    let payload = Tag::Compound(vec![
        ("Entities".to_string(), Tag::List(Vec::new())),
        ("TileEntities".to_string(), Tag::List(Vec::new())),
    ])
    .to_root_bytes()?;

    let mut buf = Vec::with_capacity(12 + payload.len());
    buf.extend_from_slice(&ENTITIES_MAGIC);
    buf.write_u32::<LittleEndian>(ENTITIES_VERSION)?;
    buf.write_u32::<LittleEndian>(payload_len(&payload)?)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

fn payload_len(payload: &[u8]) -> Result<u32, TagError> {
    u32::try_from(payload.len()).map_err(|_| TagError::TooLong(payload.len()))
}
