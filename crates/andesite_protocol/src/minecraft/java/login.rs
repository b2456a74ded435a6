//! Login branch: identity exchange, optional encryption bootstrap,
//! compression negotiation and the final acknowledgement.

use uuid::Uuid;

use crate::buffer::{PacketBuffer, DEFAULT_MAX_STRING_LEN};
use crate::error::Result;
use crate::packet::{impl_packet_meta, Packet};

const MAX_USERNAME_LEN: usize = 16;
const MAX_SERVER_ID_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginStart {
    pub username: String,
    pub uuid: Uuid,
}

impl LoginStart {
    pub const ID: i32 = 0x00;
}

impl Packet for LoginStart {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.username = buf.read_string(MAX_USERNAME_LEN)?;
        self.uuid = buf.read_uuid()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.username);
        buf.write_uuid(&self.uuid);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginDisconnect {
    /// JSON chat component.
    pub reason: String,
}

impl LoginDisconnect {
    pub const ID: i32 = 0x00;

    pub fn with_text(text: &str) -> Self {
        Self {
            reason: serde_json::json!({ "text": text }).to_string(),
        }
    }
}

impl Packet for LoginDisconnect {
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

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncryptionRequest {
    pub server_id: String,
    /// DER-encoded RSA public key.
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
    pub should_authenticate: bool,
}

impl EncryptionRequest {
    pub const ID: i32 = 0x01;
}

impl Packet for EncryptionRequest {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.server_id = buf.read_string(MAX_SERVER_ID_LEN)?;
        self.public_key = buf.read_byte_array()?;
        self.verify_token = buf.read_byte_array()?;
        self.should_authenticate = buf.read_bool()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.server_id);
        buf.write_byte_array(&self.public_key);
        buf.write_byte_array(&self.verify_token);
        buf.write_bool(self.should_authenticate);
        Ok(())
    }
}

/// Both fields are RSA-encrypted with the key from [`EncryptionRequest`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl EncryptionResponse {
    pub const ID: i32 = 0x01;
}

impl Packet for EncryptionResponse {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.shared_secret = buf.read_byte_array()?;
        self.verify_token = buf.read_byte_array()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_byte_array(&self.shared_secret);
        buf.write_byte_array(&self.verify_token);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub username: String,
    pub properties: Vec<ProfileProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

impl LoginSuccess {
    pub const ID: i32 = 0x02;
}

impl Packet for LoginSuccess {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.uuid = buf.read_uuid()?;
        self.username = buf.read_string(MAX_USERNAME_LEN)?;
        let count = buf.read_varint()?;
        self.properties = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let name = buf.read_string(DEFAULT_MAX_STRING_LEN)?;
            let value = buf.read_string(DEFAULT_MAX_STRING_LEN)?;
            let signature = if buf.read_bool()? {
                Some(buf.read_string(DEFAULT_MAX_STRING_LEN)?)
            } else {
                None
            };
            self.properties.push(ProfileProperty {
                name,
                value,
                signature,
            });
        }
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_uuid(&self.uuid);
        buf.write_string(&self.username);
        buf.write_varint(self.properties.len() as i32);
        for prop in &self.properties {
            buf.write_string(&prop.name);
            buf.write_string(&prop.value);
            buf.write_bool(prop.signature.is_some());
            if let Some(sig) = &prop.signature {
                buf.write_string(sig);
            }
        }
        Ok(())
    }
}

/// Negative threshold disables compression for the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetCompression {
    pub threshold: i32,
}

impl SetCompression {
    pub const ID: i32 = 0x03;
}

impl Packet for SetCompression {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.threshold = buf.read_varint()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_varint(self.threshold);
        Ok(())
    }
}

/// Empty body. Receipt moves the connection into Configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginAcknowledged;

impl LoginAcknowledged {
    pub const ID: i32 = 0x03;
}

impl Packet for LoginAcknowledged {
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
    fn login_start_round_trip() {
        let sent = LoginStart {
            username: "Notch".to_string(),
            uuid: Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap(),
        };
        let mut buf = PacketBuffer::new();
        sent.write_to(&mut buf).unwrap();

        let mut received = LoginStart::default();
        let mut buf = PacketBuffer::from_bytes(buf.into_bytes());
        received.read_from(&mut buf).unwrap();
        assert_eq!(received, sent);
    }

    #[test]
    fn login_start_rejects_oversized_username() {
        let mut buf = PacketBuffer::new();
        buf.write_string("ThisNameIsWayTooLongForMinecraft");
        buf.write_uuid(&Uuid::nil());

        let mut packet = LoginStart::default();
        let mut buf = PacketBuffer::from_bytes(buf.into_bytes());
        assert!(packet.read_from(&mut buf).is_err());
    }

    #[test]
    fn login_success_properties_round_trip() {
        let sent = LoginSuccess {
            uuid: Uuid::nil(),
            username: "Steve".to_string(),
            properties: vec![
                ProfileProperty {
                    name: "textures".to_string(),
                    value: "ewogIC4uLgp9".to_string(),
                    signature: Some("sig".to_string()),
                },
                ProfileProperty {
                    name: "unsigned".to_string(),
                    value: "v".to_string(),
                    signature: None,
                },
            ],
        };
        let mut buf = PacketBuffer::new();
        sent.write_to(&mut buf).unwrap();

        let mut received = LoginSuccess::default();
        let mut buf = PacketBuffer::from_bytes(buf.into_bytes());
        received.read_from(&mut buf).unwrap();
        assert_eq!(received, sent);
    }

    #[test]
    fn disconnect_reason_is_chat_component() {
        let packet = LoginDisconnect::with_text("server closed");
        let value: serde_json::Value = serde_json::from_str(&packet.reason).unwrap();
        assert_eq!(value["text"], "server closed");
    }
}
