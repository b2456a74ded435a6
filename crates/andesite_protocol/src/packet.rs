//! The uniform packet contract.
//!
//! Every packet is a plain mutable struct created empty by a registry
//! factory, filled by `read_from`, or populated by hand and serialized by
//! `write_to`. Packets are transient, one per message, never pooled.

use std::any::Any;
use std::fmt::Debug;

use crate::buffer::PacketBuffer;
use crate::error::Result;

pub trait Packet: Debug + Send + Sync {
    /// Numeric id within this packet's (state, direction) table.
    fn packet_id(&self) -> i32;

    /// Decodes the packet body. The buffer holds exactly one frame's payload
    /// with the id already consumed.
    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()>;

    /// Encodes the packet body (id excluded).
    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Encodes `packet_id ++ body`, the payload of one wire frame.
pub fn encode_payload(packet: &dyn Packet) -> Result<PacketBuffer> {
    let mut buf = PacketBuffer::new();
    buf.write_varint(packet.packet_id());
    packet.write_to(&mut buf)?;
    Ok(buf)
}

/// Implements the `as_any`/`packet_id` boilerplate for a packet struct with
/// an associated `ID` constant.
macro_rules! impl_packet_meta {
    () => {
        fn packet_id(&self) -> i32 {
            Self::ID
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    };
}

pub(crate) use impl_packet_meta;
