use std::io;

use thiserror::Error;

use crate::tag::TagId;

/// Error type for binary NBT encoding/decoding and tree manipulation.
#[derive(Error, Debug)]
pub enum NbtError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt NBT data: {0}")]
    Corrupt(String),

    #[error("invalid tag id: {0}")]
    InvalidTagId(u8),

    #[error("list element type mismatch: list holds {expected}, tried to add {found}")]
    ListTypeMismatch { expected: TagId, found: TagId },

    #[error("palette entry '{0}' has no match in structure palette")]
    UnknownPaletteEntry(String),

    #[error("block state index {index} out of bounds for palette of size {palette_len}")]
    StateIndexOutOfBounds { index: i32, palette_len: usize },

    #[error("structure compound is missing required '{0}' entry")]
    MissingStructureKey(&'static str),
}

impl NbtError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        NbtError::Corrupt(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, NbtError>;

/// SNBT parse error, carrying the byte offset where parsing failed.
#[derive(Error, Debug)]
#[error("SNBT syntax error at offset {offset}: {message}")]
pub struct SnbtError {
    pub message: String,
    pub offset: usize,
}

impl SnbtError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

pub type SnbtResult<T> = std::result::Result<T, SnbtError>;
