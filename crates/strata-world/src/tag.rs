//! Little-endian named tag encoding used by the level and entities files.
//!
//! A named tag is a one-byte type id, a name (`u16` length + UTF-8) and a
//! payload. Compounds are sequences of named tags closed by an End byte.
//! Lists carry a single element type id and an `i32` count. All integers
//! are little-endian.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;

/// Nesting limit applied while decoding.
const MAX_DEPTH: usize = 512;

/// Errors raised while encoding or decoding tags.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// Underlying reader or writer failed (including unexpected EOF).
    #[error("tag I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// An unrecognised type id was encountered.
    #[error("unknown tag id {0}")]
    UnknownId(u8),
    /// The root tag is not a compound.
    #[error("root tag must be a compound, found id {0}")]
    RootNotCompound(u8),
    /// A list holds elements of more than one type.
    #[error("list elements must share one tag type")]
    MixedList,
    /// A string, array, or list is longer than its length prefix can express.
    #[error("length {0} does not fit its length prefix")]
    TooLong(usize),
    /// A name or string is not valid UTF-8.
    #[error("invalid UTF-8 in tag string")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// A length prefix was negative.
    #[error("negative length {0}")]
    NegativeLength(i32),
    /// Compounds or lists nest deeper than the decoder allows.
    #[error("tag nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,
}

/// A tag payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    /// Homogeneous list. An empty list is written with element type End.
    List(Vec<Tag>),
    /// Named children in insertion order.
    Compound(Vec<(String, Tag)>),
    IntArray(Vec<i32>),
}

impl Tag {
    /// Type id written before this tag's name.
    pub fn id(&self) -> u8 {
        match self {
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
        }
    }

    /// Looks up a direct child of a compound by name.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        match self {
            Tag::Compound(children) => children.iter().find(|(n, _)| n == name).map(|(_, t)| t),
            _ => None,
        }
    }

    /// Integer value of any integral tag, widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v.into()),
            Tag::Short(v) => Some(v.into()),
            Tag::Int(v) => Some(v.into()),
            Tag::Long(v) => Some(v),
            _ => None,
        }
    }

    /// String value of a string tag.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    /// Writes `self` as the root tag named `name`. The root must be a compound.
    pub fn write_root<W: Write>(&self, name: &str, w: &mut W) -> Result<(), TagError> {
        if !matches!(self, Tag::Compound(_)) {
            return Err(TagError::RootNotCompound(self.id()));
        }
        w.write_u8(self.id())?;
        write_string(name, w)?;
        self.write_payload(w)
    }

    /// Encodes `self` as a root tag with an empty name into a new buffer.
    pub fn to_root_bytes(&self) -> Result<Vec<u8>, TagError> {
        let mut buf = Vec::new();
        self.write_root("", &mut buf)?;
        Ok(buf)
    }

    /// Reads a root tag, returning its name and payload.
    pub fn read_root<R: Read>(r: &mut R) -> Result<(String, Tag), TagError> {
        let id = r.read_u8()?;
        if id != TAG_COMPOUND {
            return Err(TagError::RootNotCompound(id));
        }
        let name = read_string(r)?;
        let tag = read_payload(id, r, 0)?;
        Ok((name, tag))
    }

    fn write_payload<W: Write>(&self, w: &mut W) -> Result<(), TagError> {
        match self {
            Tag::Byte(v) => w.write_i8(*v)?,
            Tag::Short(v) => w.write_i16::<LittleEndian>(*v)?,
            Tag::Int(v) => w.write_i32::<LittleEndian>(*v)?,
            Tag::Long(v) => w.write_i64::<LittleEndian>(*v)?,
            Tag::Float(v) => w.write_f32::<LittleEndian>(*v)?,
            Tag::Double(v) => w.write_f64::<LittleEndian>(*v)?,
            Tag::ByteArray(bytes) => {
                w.write_i32::<LittleEndian>(array_len(bytes.len())?)?;
                w.write_all(bytes)?;
            }
            Tag::String(s) => write_string(s, w)?,
            Tag::List(items) => {
                let element_id = items.first().map_or(TAG_END, Tag::id);
                if items.iter().any(|t| t.id() != element_id) {
                    return Err(TagError::MixedList);
                }
                w.write_u8(element_id)?;
                w.write_i32::<LittleEndian>(array_len(items.len())?)?;
                for item in items {
                    item.write_payload(w)?;
                }
            }
            Tag::Compound(children) => {
                for (name, child) in children {
                    w.write_u8(child.id())?;
                    write_string(name, w)?;
                    child.write_payload(w)?;
                }
                w.write_u8(TAG_END)?;
            }
            Tag::IntArray(values) => {
                w.write_i32::<LittleEndian>(array_len(values.len())?)?;
                for v in values {
                    w.write_i32::<LittleEndian>(*v)?;
                }
            }
        }
        Ok(())
    }
}

fn read_payload<R: Read>(id: u8, r: &mut R, depth: usize) -> Result<Tag, TagError> {
    if depth > MAX_DEPTH {
        return Err(TagError::TooDeep);
    }
    let tag = match id {
        TAG_BYTE => Tag::Byte(r.read_i8()?),
        TAG_SHORT => Tag::Short(r.read_i16::<LittleEndian>()?),
        TAG_INT => Tag::Int(r.read_i32::<LittleEndian>()?),
        TAG_LONG => Tag::Long(r.read_i64::<LittleEndian>()?),
        TAG_FLOAT => Tag::Float(r.read_f32::<LittleEndian>()?),
        TAG_DOUBLE => Tag::Double(r.read_f64::<LittleEndian>()?),
        TAG_BYTE_ARRAY => {
            let len = read_len(r)?;
            let mut bytes = Vec::new();
            r.by_ref().take(len as u64).read_to_end(&mut bytes)?;
            if bytes.len() != len {
                return Err(TagError::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
            Tag::ByteArray(bytes)
        }
        TAG_STRING => Tag::String(read_string(r)?),
        TAG_LIST => {
            let element_id = r.read_u8()?;
            let len = read_len(r)?;
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(read_payload(element_id, r, depth + 1)?);
            }
            Tag::List(items)
        }
        TAG_COMPOUND => {
            let mut children = Vec::new();
            loop {
                let child_id = r.read_u8()?;
                if child_id == TAG_END {
                    break;
                }
                let name = read_string(r)?;
                children.push((name, read_payload(child_id, r, depth + 1)?));
            }
            Tag::Compound(children)
        }
        TAG_INT_ARRAY => {
            let len = read_len(r)?;
            let mut values = Vec::new();
            for _ in 0..len {
                values.push(r.read_i32::<LittleEndian>()?);
            }
            Tag::IntArray(values)
        }
        other => return Err(TagError::UnknownId(other)),
    };
    Ok(tag)
}

fn write_string<W: Write>(s: &str, w: &mut W) -> Result<(), TagError> {
    let len = u16::try_from(s.len()).map_err(|_| TagError::TooLong(s.len()))?;
    w.write_u16::<LittleEndian>(len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(r: &mut R) -> Result<String, TagError> {
    let len = r.read_u16::<LittleEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

fn read_len<R: Read>(r: &mut R) -> Result<usize, TagError> {
    let len = r.read_i32::<LittleEndian>()?;
    usize::try_from(len).map_err(|_| TagError::NegativeLength(len))
}

fn array_len(len: usize) -> Result<i32, TagError> {
    i32::try_from(len).map_err(|_| TagError::TooLong(len))
}
