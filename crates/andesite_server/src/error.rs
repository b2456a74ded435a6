use std::io;

use thiserror::Error;

use andesite_protocol::{ProtocolError, ProtocolState};

pub const MAX_FRAME_LEN: usize = 2_097_151;

/// Connection-level failures. All of these tear the connection down; packet
/// ids unknown to the registry are not errors and are skipped instead.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("frame length {len} exceeds maximum {MAX_FRAME_LEN}")]
    FrameTooLarge { len: usize },

    #[error("connection closed mid-frame")]
    UnexpectedEof,

    #[error("compressed payload of {len} bytes is below the threshold {threshold}")]
    ThresholdViolation { len: usize, threshold: i32 },

    #[error("decompressed length {actual} does not match the declared {declared}")]
    DecompressionMismatch { declared: usize, actual: usize },

    #[error("packet id {id:#04x} is illegal in state {state}")]
    StateViolation { state: ProtocolState, id: i32 },

    #[error("encryption handshake failed: {0}")]
    Encryption(String),

    #[error("client failed keep-alive: {0}")]
    KeepAlive(String),

    #[error("disconnected: {0}")]
    Disconnected(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ConnectionError {
    pub fn encryption(msg: impl Into<String>) -> Self {
        ConnectionError::Encryption(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
