//! Connection pipeline and session management for the Andesite server.
//!
//! The pipeline is layered in a fixed order: packets are encoded, pass the
//! optional zlib stage, are framed with a VarInt length, and the optional
//! AES-CFB8 cipher wraps the finished byte stream. Inbound traffic walks
//! the same layers in reverse.

pub mod compression;
pub mod config;
pub mod connection;
pub mod encryption;
pub mod error;
pub mod io;
pub mod session;

pub use config::ServerConfig;
pub use connection::{handle_connection, Connection, ServerContext};
pub use error::{ConnectionError, Result, MAX_FRAME_LEN};
pub use session::{spawn_keepalive_ticker, SessionCommand, SessionRegistry};
