use std::io;

use thiserror::Error;

/// Error type for wire-level decoding and encoding.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed VarInt/VarLong: {0}")]
    MalformedVarInt(&'static str),

    #[error("buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },

    #[error("string length {len} exceeds maximum {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    #[error("invalid packet field: {0}")]
    InvalidField(String),

    #[error("NBT payload error: {0}")]
    Nbt(#[from] andesite_nbt::NbtError),
}

impl ProtocolError {
    pub fn invalid_field(msg: impl Into<String>) -> Self {
        ProtocolError::InvalidField(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
