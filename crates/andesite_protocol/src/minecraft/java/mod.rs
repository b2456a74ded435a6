//! Packet catalog for Minecraft Java Edition, targeting protocol 767
//! (1.21.x). Ids are versioned external data; this module pins one version
//! rather than reconciling several.

pub mod configuration;
pub mod handshake;
pub mod login;
pub mod play;
pub mod status;

use crate::packet::Packet;
use crate::registry::{Direction, PacketRegistry, ProtocolState};

use Direction::{Clientbound, Serverbound};
use ProtocolState::{Configuration, Handshaking, Login, Play, Status};

fn boxed<P: Packet + Default + 'static>() -> Box<dyn Packet> {
    Box::<P>::default()
}

/// Builds the complete id table in one deterministic pass. Called once at
/// process start; the result is immutable.
pub fn build_registry() -> PacketRegistry {
    let mut r = PacketRegistry::new();

    r.register(Handshaking, Serverbound, handshake::Handshake::ID, boxed::<handshake::Handshake>);

    r.register(Status, Serverbound, status::StatusRequest::ID, boxed::<status::StatusRequest>);
    r.register(Status, Serverbound, status::PingRequest::ID, boxed::<status::PingRequest>);
    r.register(Status, Clientbound, status::StatusResponse::ID, boxed::<status::StatusResponse>);
    r.register(Status, Clientbound, status::PongResponse::ID, boxed::<status::PongResponse>);

    r.register(Login, Serverbound, login::LoginStart::ID, boxed::<login::LoginStart>);
    r.register(Login, Serverbound, login::EncryptionResponse::ID, boxed::<login::EncryptionResponse>);
    r.register(Login, Serverbound, login::LoginAcknowledged::ID, boxed::<login::LoginAcknowledged>);
    r.register(Login, Clientbound, login::LoginDisconnect::ID, boxed::<login::LoginDisconnect>);
    r.register(Login, Clientbound, login::EncryptionRequest::ID, boxed::<login::EncryptionRequest>);
    r.register(Login, Clientbound, login::LoginSuccess::ID, boxed::<login::LoginSuccess>);
    r.register(Login, Clientbound, login::SetCompression::ID, boxed::<login::SetCompression>);

    r.register(Configuration, Serverbound, configuration::ClientInformation::ID, boxed::<configuration::ClientInformation>);
    r.register(Configuration, Serverbound, configuration::ServerboundPluginMessage::ID, boxed::<configuration::ServerboundPluginMessage>);
    r.register(Configuration, Serverbound, configuration::FinishConfigurationAck::ID, boxed::<configuration::FinishConfigurationAck>);
    r.register(Configuration, Serverbound, configuration::ServerboundConfigKeepAlive::ID, boxed::<configuration::ServerboundConfigKeepAlive>);
    r.register(Configuration, Clientbound, configuration::ClientboundPluginMessage::ID, boxed::<configuration::ClientboundPluginMessage>);
    r.register(Configuration, Clientbound, configuration::ConfigDisconnect::ID, boxed::<configuration::ConfigDisconnect>);
    r.register(Configuration, Clientbound, configuration::FinishConfiguration::ID, boxed::<configuration::FinishConfiguration>);
    r.register(Configuration, Clientbound, configuration::ClientboundConfigKeepAlive::ID, boxed::<configuration::ClientboundConfigKeepAlive>);
    r.register(Configuration, Clientbound, configuration::RegistryData::ID, boxed::<configuration::RegistryData>);

    r.register(Play, Serverbound, play::ServerboundKeepAlive::ID, boxed::<play::ServerboundKeepAlive>);
    r.register(Play, Serverbound, play::ConfigurationAck::ID, boxed::<play::ConfigurationAck>);
    r.register(Play, Clientbound, play::ClientboundKeepAlive::ID, boxed::<play::ClientboundKeepAlive>);
    r.register(Play, Clientbound, play::PlayDisconnect::ID, boxed::<play::PlayDisconnect>);
    r.register(Play, Clientbound, play::StartConfiguration::ID, boxed::<play::StartConfiguration>);

    r
}
