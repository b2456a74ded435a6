//! A single-owner byte cursor with typed read/write accessors.
//!
//! Created per inbound frame (read-only walk) or per outbound packet
//! (write-only accumulation). All multi-byte integers are big-endian except
//! VarInt/VarLong, which use the little-endian 7-bit group convention.

use bytes::{BufMut, BytesMut};
use uuid::Uuid;

use crate::error::{ProtocolError, Result};
use crate::varnum::{VarInt, VarLong};

/// Default cap for string reads that have no tighter caller bound.
pub const DEFAULT_MAX_STRING_LEN: usize = 32767;

#[derive(Debug, Default, Clone)]
pub struct PacketBuffer {
    data: BytesMut,
    cursor: usize,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: BytesMut) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            data: BytesMut::from(data),
            cursor: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// The accumulated bytes (write side).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> BytesMut {
        self.data
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::BufferUnderrun {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(slice)
    }

    // --- Reads ---

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_varint(&mut self) -> Result<i32> {
        let (value, consumed) = VarInt::read_from(&self.data[self.cursor..])?;
        self.cursor += consumed;
        Ok(value.0)
    }

    pub fn read_varlong(&mut self) -> Result<i64> {
        let (value, consumed) = VarLong::read_from(&self.data[self.cursor..])?;
        self.cursor += consumed;
        Ok(value.0)
    }

    /// Reads a VarInt-length-prefixed UTF-8 string. The declared byte length
    /// is checked against `max_len` before any allocation happens.
    pub fn read_string(&mut self, max_len: usize) -> Result<String> {
        let len = self.read_varint()?;
        if len < 0 {
            return Err(ProtocolError::NegativeLength(len));
        }
        let len = len as usize;
        if len > max_len {
            return Err(ProtocolError::StringTooLong { len, max: max_len });
        }
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ProtocolError::invalid_field("string is not valid UTF-8"))
    }

    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let bytes: [u8; 16] = self.take(16)?.try_into().unwrap();
        Ok(Uuid::from_bytes(bytes))
    }

    /// Reads a VarInt-length-prefixed byte array.
    pub fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let len = self.read_varint()?;
        if len < 0 {
            return Err(ProtocolError::NegativeLength(len));
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    /// Consumes and returns all remaining bytes.
    pub fn read_remaining(&mut self) -> Vec<u8> {
        let rest = self.data[self.cursor..].to_vec();
        self.cursor = self.data.len();
        rest
    }

    // --- Writes ---

    pub fn write_bool(&mut self, v: bool) {
        self.data.put_u8(v as u8);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.put_u8(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.data.put_i8(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.data.put_i16(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.data.put_u16(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.data.put_i32(v);
    }

    pub fn write_i64(&mut self, v: i64) {
        self.data.put_i64(v);
    }

    pub fn write_f32(&mut self, v: f32) {
        self.data.put_f32(v);
    }

    pub fn write_f64(&mut self, v: f64) {
        self.data.put_f64(v);
    }

    pub fn write_varint(&mut self, v: i32) {
        VarInt(v).write_to_bytes(&mut self.data);
    }

    pub fn write_varlong(&mut self, v: i64) {
        VarLong(v).write_to_bytes(&mut self.data);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_varint(s.len() as i32);
        self.data.extend_from_slice(s.as_bytes());
    }

    pub fn write_uuid(&mut self, uuid: &Uuid) {
        self.data.extend_from_slice(uuid.as_bytes());
    }

    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as i32);
        self.data.extend_from_slice(bytes);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

// Lets self-describing payloads (NBT) stream directly out of the cursor
// without an intermediate copy.
impl std::io::Read for PacketBuffer {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.data[self.cursor..];
        let n = remaining.len().min(out.len());
        out[..n].copy_from_slice(&remaining[..n]);
        self.cursor += n;
        Ok(n)
    }
}

impl std::io::Write for PacketBuffer {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.data.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
