//! Framed packet streams over the raw transport.

mod reader;
mod writer;

pub use reader::PacketReader;
pub use writer::PacketWriter;

use bytes::BytesMut;

/// One decoded frame: the packet id and the undecoded body bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPacket {
    pub id: i32,
    pub body: BytesMut,
}
