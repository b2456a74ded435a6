//! Wire-level types for the Andesite server.
//!
//! Covers variable-length integers, the typed packet buffer, the packet
//! trait and id registry, and the Java Edition packet catalog for the
//! handshaking, status, login, configuration and play states.

pub mod buffer;
pub mod error;
pub mod minecraft;
pub mod packet;
pub mod registry;
pub mod varnum;

pub use buffer::{PacketBuffer, DEFAULT_MAX_STRING_LEN};
pub use error::{ProtocolError, Result};
pub use packet::{encode_payload, Packet};
pub use registry::{Direction, PacketRegistry, ProtocolState};
pub use varnum::{VarInt, VarLong};

pub use minecraft::java::build_registry;
