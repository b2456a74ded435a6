//! Configuration branch. Entered from Login (or re-entered from Play) to
//! exchange client settings and registry data before gameplay.

use andesite_nbt::{read_named, write_named, CompoundTag, NamedTag, Tag};

use crate::buffer::{PacketBuffer, DEFAULT_MAX_STRING_LEN};
use crate::error::Result;
use crate::packet::{impl_packet_meta, Packet};

const MAX_LOCALE_LEN: usize = 16;
const MAX_IDENTIFIER_LEN: usize = 32767;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientInformation {
    pub locale: String,
    pub view_distance: i8,
    pub chat_mode: i32,
    pub chat_colors: bool,
    pub displayed_skin_parts: u8,
    pub main_hand: i32,
    pub text_filtering: bool,
    pub allow_server_listings: bool,
}

impl ClientInformation {
    pub const ID: i32 = 0x00;
}

impl Packet for ClientInformation {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.locale = buf.read_string(MAX_LOCALE_LEN)?;
        self.view_distance = buf.read_i8()?;
        self.chat_mode = buf.read_varint()?;
        self.chat_colors = buf.read_bool()?;
        self.displayed_skin_parts = buf.read_u8()?;
        self.main_hand = buf.read_varint()?;
        self.text_filtering = buf.read_bool()?;
        self.allow_server_listings = buf.read_bool()?;
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.locale);
        buf.write_i8(self.view_distance);
        buf.write_varint(self.chat_mode);
        buf.write_bool(self.chat_colors);
        buf.write_u8(self.displayed_skin_parts);
        buf.write_varint(self.main_hand);
        buf.write_bool(self.text_filtering);
        buf.write_bool(self.allow_server_listings);
        Ok(())
    }
}

/// Opaque channel payload. The body runs to the end of the frame, so there
/// is no length prefix on `data`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerboundPluginMessage {
    pub channel: String,
    pub data: Vec<u8>,
}

impl ServerboundPluginMessage {
    pub const ID: i32 = 0x02;
}

impl Packet for ServerboundPluginMessage {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.channel = buf.read_string(MAX_IDENTIFIER_LEN)?;
        self.data = buf.read_remaining();
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.channel);
        buf.write_bytes(&self.data);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientboundPluginMessage {
    pub channel: String,
    pub data: Vec<u8>,
}

impl ClientboundPluginMessage {
    pub const ID: i32 = 0x01;

    pub fn brand(name: &str) -> Self {
        let mut payload = PacketBuffer::new();
        payload.write_string(name);
        Self {
            channel: "minecraft:brand".to_string(),
            data: payload.into_bytes().to_vec(),
        }
    }
}

impl Packet for ClientboundPluginMessage {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.channel = buf.read_string(MAX_IDENTIFIER_LEN)?;
        self.data = buf.read_remaining();
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.channel);
        buf.write_bytes(&self.data);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDisconnect {
    /// JSON chat component.
    pub reason: String,
}

impl ConfigDisconnect {
    pub const ID: i32 = 0x02;

    pub fn with_text(text: &str) -> Self {
        Self {
            reason: serde_json::json!({ "text": text }).to_string(),
        }
    }
}

impl Packet for ConfigDisconnect {
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

/// Empty body. The client answers with [`FinishConfigurationAck`], which
/// moves the connection into Play.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FinishConfiguration;

impl FinishConfiguration {
    pub const ID: i32 = 0x03;
}

impl Packet for FinishConfiguration {
    impl_packet_meta!();

    fn read_from(&mut self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }

    fn write_to(&self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FinishConfigurationAck;

impl FinishConfigurationAck {
    pub const ID: i32 = 0x03;
}

impl Packet for FinishConfigurationAck {
    impl_packet_meta!();

    fn read_from(&mut self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }

    fn write_to(&self, _buf: &mut PacketBuffer) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientboundConfigKeepAlive {
    pub id: i64,
}

impl ClientboundConfigKeepAlive {
    pub const ID: i32 = 0x04;
}

impl Packet for ClientboundConfigKeepAlive {
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
pub struct ServerboundConfigKeepAlive {
    pub id: i64,
}

impl ServerboundConfigKeepAlive {
    pub const ID: i32 = 0x04;
}

impl Packet for ServerboundConfigKeepAlive {
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

/// One registry's worth of entries. Entry payloads are binary NBT compounds
/// with an empty root name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistryData {
    pub registry_id: String,
    pub entries: Vec<RegistryEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub entry_id: String,
    pub data: Option<CompoundTag>,
}

impl RegistryData {
    pub const ID: i32 = 0x07;
}

impl Packet for RegistryData {
    impl_packet_meta!();

    fn read_from(&mut self, buf: &mut PacketBuffer) -> Result<()> {
        self.registry_id = buf.read_string(MAX_IDENTIFIER_LEN)?;
        let count = buf.read_varint()?;
        self.entries = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let entry_id = buf.read_string(MAX_IDENTIFIER_LEN)?;
            let data = if buf.read_bool()? {
                match read_named(buf)?.tag {
                    Tag::Compound(compound) => Some(compound),
                    other => {
                        return Err(crate::error::ProtocolError::invalid_field(format!(
                            "registry entry payload must be a compound, got {}",
                            other.id().name()
                        )));
                    }
                }
            } else {
                None
            };
            self.entries.push(RegistryEntry { entry_id, data });
        }
        Ok(())
    }

    fn write_to(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_string(&self.registry_id);
        buf.write_varint(self.entries.len() as i32);
        for entry in &self.entries {
            buf.write_string(&entry.entry_id);
            buf.write_bool(entry.data.is_some());
            if let Some(compound) = &entry.data {
                let named = NamedTag::new("", Tag::Compound(compound.clone()));
                write_named(buf, &named)?;
            }
        }
        Ok(())
    }
}
