use crate::buffer::PacketBuffer;
use crate::error::{ProtocolError, Result};
use crate::packet::impl_packet_meta;
use crate::packet::Packet;

const MAX_ADDRESS_LEN: usize = 255;

/// First packet of every connection. `next_state` picks the branch the
/// rest of the session follows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: i32,
}

impl Handshake {
    pub const ID: i32 = 0x00;

    pub const STATE_STATUS: i32 = 1;
    pub const STATE_LOGIN: i32 = 2;

    pub fn new(
        protocol_version: i32,
        server_address: String,
        server_port: u16,
        next_state: i32,
    ) -> Self {
        Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        }
    }

    pub fn is_status_request(&self) -> bool {
        self.next_state == Self::STATE_STATUS
    }

    pub fn is_login_request(&self) -> bool {
        self.next_state == Self::STATE_LOGIN
    }
}

impl Packet for Handshake {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.protocol_version = buf.read_varint()?;
        self.server_address = buf.read_string(MAX_ADDRESS_LEN)?;
        self.server_port = buf.read_u16()?;
        self.next_state = buf.read_varint()?;
        if self.next_state != Self::STATE_STATUS && self.next_state != Self::STATE_LOGIN {
            return Err(ProtocolError::invalid_field(format!(
                "handshake next_state must be 1 or 2, got {}",
                self.next_state
            )));
        }
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_varint(self.protocol_version);
        buf.write_string(&self.server_address);
        buf.write_u16(self.server_port);
        buf.write_varint(self.next_state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let sent = Handshake::new(767, "play.example.net".to_string(), 25565, 2);
        let mut buf = PacketBuffer::new();
        sent.write_to(&mut buf).unwrap();

        let mut received = Handshake::default();
        let mut buf = PacketBuffer::from_bytes(buf.into_bytes());
        received.read_from(&mut buf).unwrap();

        assert_eq!(received, sent);
        assert!(received.is_login_request());
        assert!(!received.is_status_request());
    }

    #[test]
    fn rejects_unknown_next_state() {
        let mut buf = PacketBuffer::new();
        buf.write_varint(767);
        buf.write_string("play.example.net");
        buf.write_u16(25565);
        buf.write_varint(5);

        let mut packet = Handshake::default();
        let mut buf = PacketBuffer::from_bytes(buf.into_bytes());
        assert!(packet.read_from(&mut buf).is_err());
    }
}
