//! Variable-length integers: 7 value bits per byte, continuation flag in the
//! high bit, least-significant group first.

use bytes::{BufMut, BytesMut};

use crate::error::{ProtocolError, Result};

const SEGMENT_BITS: u32 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Number of bytes this value occupies on the wire (1..=5).
    pub fn len(&self) -> usize {
        let mut value = self.0 as u32;
        let mut size = 1;
        while value > SEGMENT_BITS {
            value >>= 7;
            size += 1;
        }
        size
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn write_to_bytes(&self, bytes: &mut BytesMut) {
        let mut value = self.0 as u32;
        loop {
            let mut byte = (value & SEGMENT_BITS) as u8;
            value >>= 7;
            if value != 0 {
                byte |= CONTINUE_BIT;
            }
            bytes.put_u8(byte);
            if value == 0 {
                break;
            }
        }
    }

    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(5);
        self.write_to_bytes(&mut buf);
        buf
    }

    /// Decodes a VarInt from the head of `bytes`, returning the value and the
    /// number of bytes consumed. Fails after 5 bytes without a terminator;
    /// `None`-like truncation is reported as a distinct error so a frame
    /// splitter can ask for more input.
    pub fn read_from(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut value: i32 = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if i >= 5 {
                return Err(ProtocolError::MalformedVarInt("VarInt exceeds 5 bytes"));
            }
            value |= ((byte & SEGMENT_BITS as u8) as i32) << (7 * i);
            if byte & CONTINUE_BIT == 0 {
                return Ok((VarInt(value), i + 1));
            }
        }
        if bytes.len() >= 5 {
            return Err(ProtocolError::MalformedVarInt("VarInt exceeds 5 bytes"));
        }
        Err(ProtocolError::BufferUnderrun {
            needed: bytes.len() + 1,
            remaining: bytes.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLong(pub i64);

impl VarLong {
    pub fn len(&self) -> usize {
        let mut value = self.0 as u64;
        let mut size = 1;
        while value > SEGMENT_BITS as u64 {
            value >>= 7;
            size += 1;
        }
        size
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn write_to_bytes(&self, bytes: &mut BytesMut) {
        let mut value = self.0 as u64;
        loop {
            let mut byte = (value & SEGMENT_BITS as u64) as u8;
            value >>= 7;
            if value != 0 {
                byte |= CONTINUE_BIT;
            }
            bytes.put_u8(byte);
            if value == 0 {
                break;
            }
        }
    }

    pub fn read_from(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut value: i64 = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if i >= 10 {
                return Err(ProtocolError::MalformedVarInt("VarLong exceeds 10 bytes"));
            }
            value |= ((byte & SEGMENT_BITS as u8) as i64) << (7 * i);
            if byte & CONTINUE_BIT == 0 {
                return Ok((VarLong(value), i + 1));
            }
        }
        if bytes.len() >= 10 {
            return Err(ProtocolError::MalformedVarInt("VarLong exceeds 10 bytes"));
        }
        Err(ProtocolError::BufferUnderrun {
            needed: bytes.len() + 1,
            remaining: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_round_trip() {
        for value in [0, 1, 127, 128, 255, 25565, 2097151, i32::MAX, -1, i32::MIN] {
            let encoded = VarInt(value).to_bytes();
            assert!(!encoded.is_empty() && encoded.len() <= 5);
            assert_eq!(encoded.len(), VarInt(value).len());

            let (decoded, consumed) = VarInt::read_from(&encoded).unwrap();
            assert_eq!(decoded.0, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn known_encodings() {
        assert_eq!(&VarInt(0).to_bytes()[..], &[0x00]);
        assert_eq!(&VarInt(128).to_bytes()[..], &[0x80, 0x01]);
        assert_eq!(&VarInt(255).to_bytes()[..], &[0xFF, 0x01]);
        assert_eq!(&VarInt(-1).to_bytes()[..], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn varint_overlong_is_malformed() {
        // Six continuation bytes never terminate a 32-bit VarInt.
        let err = VarInt::read_from(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedVarInt(_)));
    }

    #[test]
    fn varint_truncation_is_underrun_not_malformed() {
        let err = VarInt::read_from(&[0x80, 0x80]).unwrap_err();
        assert!(matches!(err, ProtocolError::BufferUnderrun { .. }));
    }

    #[test]
    fn varlong_round_trip() {
        for value in [0i64, 1, 127, 128, i64::MAX, -1, i64::MIN] {
            let mut buf = BytesMut::new();
            VarLong(value).write_to_bytes(&mut buf);
            assert!(buf.len() <= 10);
            let (decoded, consumed) = VarLong::read_from(&buf).unwrap();
            assert_eq!(decoded.0, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn varlong_overlong_is_malformed() {
        let bytes = [0x80u8; 11];
        let err = VarLong::read_from(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedVarInt(_)));
    }
}
