//! Binary NBT encoding and decoding.
//!
//! A named root is `type_id:u8, name:modified-utf8, payload` (the name and
//! payload are omitted for a bare `End`). Compounds are sequences of
//! `(type_id, name, payload)` triples terminated by an `End` byte; lists are
//! `(element_id:u8, count:i32, count x payload)` with no per-element ids.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{NbtError, Result};
use crate::mutf8;
use crate::tag::{CompoundTag, ListTag, NamedTag, Tag, TagId};

/// Decoded trees deeper than this are rejected as corrupt. Keeps a hostile
/// stream from exhausting the stack with nested lists/compounds.
const MAX_DEPTH: usize = 512;

/// Declared array/list lengths above this fail before allocation.
const MAX_LEN: i32 = 1 << 25;

/// Reads one named tag from an uncompressed stream.
pub fn read_named<R: Read>(reader: &mut R) -> Result<NamedTag> {
    let id = TagId::from_u8(read_u8(reader)?)?;
    if id == TagId::End {
        return Ok(NamedTag::new("", Tag::End));
    }
    let name = read_string(reader)?;
    let tag = read_payload(reader, id, 0)?;
    Ok(NamedTag::new(name, tag))
}

/// Writes one named tag to an uncompressed stream.
pub fn write_named<W: Write>(writer: &mut W, nbt: &NamedTag) -> Result<()> {
    writer.write_all(&[nbt.tag.id() as u8])?;
    if nbt.tag.id() != TagId::End {
        write_string(writer, &nbt.name)?;
        write_payload(writer, &nbt.tag)?;
    }
    Ok(())
}

/// Reads one named tag from a gzip-compressed stream.
pub fn read_gzipped<R: Read>(reader: R) -> Result<NamedTag> {
    let mut decoder = GzDecoder::new(reader);
    read_named(&mut decoder)
}

/// Writes one named tag to a stream, gzip-compressing it.
pub fn write_gzipped<W: Write>(writer: W, nbt: &NamedTag) -> Result<()> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    write_named(&mut encoder, nbt)?;
    encoder.finish()?;
    Ok(())
}

fn read_payload<R: Read>(reader: &mut R, id: TagId, depth: usize) -> Result<Tag> {
    if depth > MAX_DEPTH {
        return Err(NbtError::corrupt("tag tree exceeds maximum depth"));
    }
    Ok(match id {
        TagId::End => Tag::End,
        TagId::Byte => Tag::Byte(read_u8(reader)? as i8),
        TagId::Short => Tag::Short(i16::from_be_bytes(read_array(reader)?)),
        TagId::Int => Tag::Int(i32::from_be_bytes(read_array(reader)?)),
        TagId::Long => Tag::Long(i64::from_be_bytes(read_array(reader)?)),
        TagId::Float => Tag::Float(f32::from_be_bytes(read_array(reader)?)),
        TagId::Double => Tag::Double(f64::from_be_bytes(read_array(reader)?)),
        TagId::ByteArray => {
            let len = read_len(reader, "byte array")?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            Tag::ByteArray(buf.into_iter().map(|b| b as i8).collect())
        }
        TagId::String => Tag::String(read_string(reader)?),
        TagId::List => {
            let element = TagId::from_u8(read_u8(reader)?)?;
            let count = i32::from_be_bytes(read_array(reader)?);
            if count < 0 || count > MAX_LEN {
                return Err(NbtError::corrupt(format!(
                    "implausible list length: {count}"
                )));
            }
            if count > 0 && element == TagId::End {
                return Err(NbtError::corrupt("non-empty list with End element type"));
            }
            let mut list = ListTag::with_element(element);
            for _ in 0..count {
                list.try_push(read_payload(reader, element, depth + 1)?)?;
            }
            Tag::List(list)
        }
        TagId::Compound => {
            let mut compound = CompoundTag::new();
            loop {
                let child_id = TagId::from_u8(read_u8(reader)?)?;
                if child_id == TagId::End {
                    break;
                }
                let name = read_string(reader)?;
                let child = read_payload(reader, child_id, depth + 1)?;
                compound.put(name, child);
            }
            Tag::Compound(compound)
        }
        TagId::IntArray => {
            let len = read_len(reader, "int array")?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(i32::from_be_bytes(read_array(reader)?));
            }
            Tag::IntArray(values)
        }
        TagId::LongArray => {
            let len = read_len(reader, "long array")?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(i64::from_be_bytes(read_array(reader)?));
            }
            Tag::LongArray(values)
        }
    })
}

fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> Result<()> {
    match tag {
        Tag::End => {}
        Tag::Byte(v) => writer.write_all(&[*v as u8])?,
        Tag::Short(v) => writer.write_all(&v.to_be_bytes())?,
        Tag::Int(v) => writer.write_all(&v.to_be_bytes())?,
        Tag::Long(v) => writer.write_all(&v.to_be_bytes())?,
        Tag::Float(v) => writer.write_all(&v.to_be_bytes())?,
        Tag::Double(v) => writer.write_all(&v.to_be_bytes())?,
        Tag::ByteArray(v) => {
            writer.write_all(&(v.len() as i32).to_be_bytes())?;
            let bytes: Vec<u8> = v.iter().map(|b| *b as u8).collect();
            writer.write_all(&bytes)?;
        }
        Tag::String(v) => write_string(writer, v)?,
        Tag::List(list) => {
            writer.write_all(&[list.element() as u8])?;
            writer.write_all(&(list.len() as i32).to_be_bytes())?;
            for item in list {
                write_payload(writer, item)?;
            }
        }
        Tag::Compound(compound) => {
            for (name, child) in compound.iter() {
                writer.write_all(&[child.id() as u8])?;
                write_string(writer, name)?;
                write_payload(writer, child)?;
            }
            writer.write_all(&[TagId::End as u8])?;
        }
        Tag::IntArray(v) => {
            writer.write_all(&(v.len() as i32).to_be_bytes())?;
            for value in v {
                writer.write_all(&value.to_be_bytes())?;
            }
        }
        Tag::LongArray(v) => {
            writer.write_all(&(v.len() as i32).to_be_bytes())?;
            for value in v {
                writer.write_all(&value.to_be_bytes())?;
            }
        }
    }
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = u16::from_be_bytes(read_array(reader)?) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(mutf8::decode(&buf))
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    let encoded = mutf8::encode(s);
    if encoded.len() > u16::MAX as usize {
        return Err(NbtError::corrupt(format!(
            "string too long for NBT: {} bytes",
            encoded.len()
        )));
    }
    writer.write_all(&(encoded.len() as u16).to_be_bytes())?;
    writer.write_all(&encoded)?;
    Ok(())
}

fn read_len<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let len = i32::from_be_bytes(read_array(reader)?);
    if len < 0 || len > MAX_LEN {
        return Err(NbtError::corrupt(format!(
            "implausible {what} length: {len}"
        )));
    }
    Ok(len as usize)
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
