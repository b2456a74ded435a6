//! Play branch. Only the session-maintenance subset: keep-alives, the
//! disconnect, and the round trip back into Configuration.

use crate::buffer::{PacketBuffer, DEFAULT_MAX_STRING_LEN};
use crate::error::Result;
use crate::packet::{impl_packet_meta, Packet};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientboundKeepAlive {
    pub id: i64,
}

impl ClientboundKeepAlive {
    pub const ID: i32 = 0x26;
}

impl Packet for ClientboundKeepAlive {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.id = buf.read_i64()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_i64(self.id);
        Ok(())
    }
}

/// Must echo the id from the matching [`ClientboundKeepAlive`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerboundKeepAlive {
    pub id: i64,
}

impl ServerboundKeepAlive {
    pub const ID: i32 = 0x1A;
}

impl Packet for ServerboundKeepAlive {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.id = buf.read_i64()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_i64(self.id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayDisconnect {
    /// JSON chat component.
    pub reason: String,
}

impl PlayDisconnect {
    pub const ID: i32 = 0x1D;

    pub fn with_text(text: &str) -> Self {
        Self {
            reason: serde_json::json!({ "text": text }).to_string(),
        }
    }
}

impl Packet for PlayDisconnect {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.reason = buf.read_string(DEFAULT_MAX_STRING_LEN)?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.reason);
        Ok(())
    }
}

/// Empty body. Asks the client to return to Configuration; the client
/// confirms with [`ConfigurationAck`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartConfiguration;

impl StartConfiguration {
    pub const ID: i32 = 0x6F;
}

impl Packet for StartConfiguration {
    impl_packet_meta!();

    fn read_from(&mut self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }

    fn write_to(&self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigurationAck;

impl ConfigurationAck {
    pub const ID: i32 = 0x0E;
}

impl Packet for ConfigurationAck {
    impl_packet_meta!();

    fn read_from(&mut self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }

    fn write_to(&self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_alive_round_trip() {
        let sent = ClientboundKeepAlive {
            id: 0x1122_3344_5566_7788,
        };
        let mut buf = PacketBuffer::new();
        sent.write_to(&mut buf).unwrap();

        let mut echo = ServerboundKeepAlive::default();
        let mut buf = PacketBuffer::from_bytes(buf.into_bytes());
        echo.read_from(&mut buf).unwrap();
        assert_eq!(echo.id, sent.id);
    }

    #[test]
    fn empty_bodies_stay_empty() {
        let mut buf = PacketBuffer::new();
        StartConfiguration.write_to(&mut buf).unwrap();
        assert!(buf.as_bytes().is_empty());

        let mut buf = PacketBuffer::new();
        ConfigurationAck.write_to(&mut buf).unwrap();
        assert!(buf.as_bytes().is_empty());
    }
}
