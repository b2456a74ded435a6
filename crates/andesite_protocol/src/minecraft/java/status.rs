//! Status branch: list ping request/response and the latency echo pair.

use serde::{Deserialize, Serialize};

use crate::buffer::{PacketBuffer, DEFAULT_MAX_STRING_LEN};
use crate::error::Result;
use crate::packet::{impl_packet_meta, Packet};

/// JSON document carried by [`StatusResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub version: StatusVersion,
    pub players: StatusPlayers,
    pub description: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default)]
    pub enforces_secure_chat: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPlayers {
    pub max: i32,
    pub online: i32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sample: Vec<StatusPlayerSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPlayerSample {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusRequest;

impl StatusRequest {
    pub const ID: i32 = 0x00;
}

impl Packet for StatusRequest {
    impl_packet_meta!();

    fn read_from(&mut self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }

    fn write_to(&self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusResponse {
    pub json_response: String,
}

impl StatusResponse {
    pub const ID: i32 = 0x00;

    pub fn from_status(status: &ServerStatus) -> serde_json::Result<Self> {
        Ok(Self {
            json_response: serde_json::to_string(status)?,
        })
    }
}

impl Packet for StatusResponse {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.json_response = buf.read_string(DEFAULT_MAX_STRING_LEN)?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.json_response);
        Ok(())
    }
}

/// Client-chosen payload echoed back verbatim by [`PongResponse`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PingRequest {
    pub payload: i64,
}

impl PingRequest {
    pub const ID: i32 = 0x01;
}

impl Packet for PingRequest {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.payload = buf.read_i64()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_i64(self.payload);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PongResponse {
    pub payload: i64,
}

impl PongResponse {
    pub const ID: i32 = 0x01;
}

impl Packet for PongResponse {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.payload = buf.read_i64()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_i64(self.payload);
        Ok(())
    }
}
