//! One accepted socket, from handshake to disconnect.
//!
//! The connection owns both pipeline halves and walks the protocol states:
//! Handshaking branches to Status or Login, Login negotiates encryption and
//! compression, Configuration exchanges settings and registry data, Play
//! holds the session alive. A state is committed only after its handler
//! returns successfully.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use andesite_nbt::from_snbt;
use andesite_protocol::minecraft::java::{configuration, handshake, login, play, status};
use andesite_protocol::{Direction, Packet, PacketBuffer, PacketRegistry, ProtocolState};

use crate::config::ServerConfig;
use crate::encryption::{create_ciphers, KeyExchange};
use crate::error::{ConnectionError, Result};
use crate::io::{PacketReader, PacketWriter, RawPacket};
use crate::session::{offline_uuid, SessionCommand, SessionRegistry};

/// Everything a connection task shares with the rest of the server.
pub struct ServerContext {
    pub config: ServerConfig,
    pub sessions: Arc<SessionRegistry>,
    pub packets: PacketRegistry,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(SessionRegistry::new()),
            packets: andesite_protocol::build_registry(),
        }
    }
}

pub struct Connection {
    reader: PacketReader<BufReader<OwnedReadHalf>>,
    writer: PacketWriter<BufWriter<OwnedWriteHalf>>,
    peer: SocketAddr,
    state: ProtocolState,
    ctx: Arc<ServerContext>,
    commands: Option<mpsc::Receiver<SessionCommand>>,
    player: Option<(Uuid, String)>,
    pending_keepalive: Option<(i64, Instant)>,
    awaiting_config_ack: bool,
}

/// Drives a freshly accepted socket to completion, unregistering the
/// session (if any) regardless of how the connection ends.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    ctx: Arc<ServerContext>,
) -> Result<()> {
    let mut connection = Connection::new(stream, peer, ctx.clone());
    let outcome = connection.run().await;
    if let Some((uuid, username)) = &connection.player {
        ctx.sessions.unregister(uuid);
        info!(%peer, %username, "session closed");
    }
    outcome
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: Arc<ServerContext>) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: PacketReader::new(BufReader::new(read_half)),
            writer: PacketWriter::new(BufWriter::new(write_half)),
            peer,
            state: ProtocolState::Handshaking,
            ctx,
            commands: None,
            player: None,
            pending_keepalive: None,
            awaiting_config_ack: false,
        }
    }

    async fn run(&mut self) -> Result<()> {
        let next_state = self.handle_handshake().await?;
        self.state = next_state;

        match self.state {
            ProtocolState::Status => self.handle_status().await,
            ProtocolState::Login => {
                self.handle_login().await?;
                self.state = ProtocolState::Configuration;
                loop {
                    self.handle_configuration().await?;
                    self.state = ProtocolState::Play;
                    match self.handle_play().await? {
                        PlayOutcome::Reconfigure => {
                            self.state = ProtocolState::Configuration;
                        }
                        PlayOutcome::Closed => return Ok(()),
                    }
                }
            }
            state => Err(ConnectionError::StateViolation { state, id: -1 }),
        }
    }

    /// Reads the next serverbound frame, resolving it through the registry.
    /// Unknown ids are skipped with a debug log; in Handshaking any unknown
    /// id is fatal because nothing else may precede the handshake.
    async fn next_packet(&mut self) -> Result<Option<Box<dyn Packet>>> {
        loop {
            let raw = match self.read_raw().await? {
                Some(raw) => raw,
                None => return Ok(None),
            };
            match self
                .ctx
                .packets
                .create(self.state, Direction::Serverbound, raw.id)
            {
                Some(mut packet) => {
                    decode_into(&mut *packet, &raw)?;
                    return Ok(Some(packet));
                }
                None if self.state == ProtocolState::Handshaking => {
                    return Err(ConnectionError::StateViolation {
                        state: self.state,
                        id: raw.id,
                    });
                }
                None => {
                    debug!(id = %format_args!("{:#04x}", raw.id), state = %self.state, "skipping unknown packet");
                }
            }
        }
    }

    async fn read_raw(&mut self) -> Result<Option<RawPacket>> {
        let timeout = Duration::from_secs(self.ctx.config.read_timeout_secs);
        match tokio::time::timeout(timeout, self.reader.read_packet()).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Disconnected("read timed out".to_string())),
        }
    }

    /// Reads one packet and requires it to be `P`; anything else out of
    /// sequence tears the connection down.
    async fn expect<P: Packet + Clone + Default + 'static>(&mut self) -> Result<P> {
        let packet = self
            .next_packet()
            .await?
            .ok_or(ConnectionError::UnexpectedEof)?;
        packet
            .as_any()
            .downcast_ref::<P>()
            .cloned()
            .ok_or(ConnectionError::StateViolation {
                state: self.state,
                id: packet.packet_id(),
            })
    }

    async fn handle_handshake(&mut self) -> Result<ProtocolState> {
        let handshake: handshake::Handshake = self.expect().await?;
        debug!(
            peer = %self.peer,
            protocol = handshake.protocol_version,
            address = %handshake.server_address,
            "handshake received"
        );
        if handshake.is_status_request() {
            Ok(ProtocolState::Status)
        } else {
            Ok(ProtocolState::Login)
        }
    }

    async fn handle_status(&mut self) -> Result<()> {
        loop {
            let packet = match self.next_packet().await? {
                Some(packet) => packet,
                None => return Ok(()),
            };
            if let Some(_request) = packet.as_any().downcast_ref::<status::StatusRequest>() {
                let online = self.ctx.sessions.count() as i32;
                let body = self.ctx.config.server_status(online);
                let response = status::StatusResponse::from_status(&body)
                    .map_err(|e| ConnectionError::Disconnected(e.to_string()))?;
                self.writer.write_packet(&response).await?;
            } else if let Some(ping) = packet.as_any().downcast_ref::<status::PingRequest>() {
                let pong = status::PongResponse {
                    payload: ping.payload,
                };
                self.writer.write_packet(&pong).await?;
                return Ok(());
            } else {
                return Err(ConnectionError::StateViolation {
                    state: self.state,
                    id: packet.packet_id(),
                });
            }
        }
    }

    async fn handle_login(&mut self) -> Result<()> {
        let start: login::LoginStart = self.expect().await?;
        let username = start.username.clone();
        let uuid = offline_uuid(&username);
        debug!(peer = %self.peer, %username, %uuid, "login start");

        if self.ctx.config.online_mode {
            self.run_encryption_handshake().await?;
        }

        if self.ctx.config.compression_enabled() {
            let threshold = self.ctx.config.compression_threshold;
            self.writer
                .write_packet(&login::SetCompression { threshold })
                .await?;
            self.writer.enable_compression(threshold);
            self.reader.enable_compression(threshold);
        }

        if self.ctx.sessions.count() as i32 >= self.ctx.config.max_players {
            let disconnect = login::LoginDisconnect::with_text("The server is full");
            self.writer.write_packet(&disconnect).await?;
            return Err(ConnectionError::Disconnected("server full".to_string()));
        }

        let success = login::LoginSuccess {
            uuid,
            username: username.clone(),
            properties: Vec::new(),
        };
        self.writer.write_packet(&success).await?;

        let _ack: login::LoginAcknowledged = self.expect().await?;

        self.commands = Some(self.ctx.sessions.register(uuid, username.clone()));
        self.player = Some((uuid, username.clone()));
        info!(peer = %self.peer, %username, "player logged in");
        Ok(())
    }

    async fn run_encryption_handshake(&mut self) -> Result<()> {
        let exchange = KeyExchange::new()?;
        let request = login::EncryptionRequest {
            server_id: String::new(),
            public_key: exchange.public_key_der().to_vec(),
            verify_token: exchange.verify_token().to_vec(),
            should_authenticate: false,
        };
        self.writer.write_packet(&request).await?;

        let response: login::EncryptionResponse = self.expect().await?;
        if !exchange.verify_token_matches(&response.verify_token) {
            return Err(ConnectionError::encryption("verify token mismatch"));
        }
        let shared_secret = exchange.decrypt_shared_secret(&response.shared_secret)?;

        // Session-server authentication is out of scope; the hash is still
        // computed the way an authenticating server would.
        let server_hash = exchange.server_id_hash("", &shared_secret);
        debug!(peer = %self.peer, %server_hash, "encryption established");

        let (encrypt, decrypt) = create_ciphers(&shared_secret)?;
        self.writer.enable_encryption(encrypt);
        self.reader.enable_encryption(decrypt);
        Ok(())
    }

    async fn handle_configuration(&mut self) -> Result<()> {
        self.writer
            .write_packet(&configuration::ClientboundPluginMessage::brand("andesite"))
            .await?;
        self.writer.write_packet(&dimension_registry()?).await?;
        self.writer
            .write_packet(&configuration::FinishConfiguration)
            .await?;

        loop {
            let packet = self
                .next_packet()
                .await?
                .ok_or(ConnectionError::UnexpectedEof)?;
            let any = packet.as_any();

            if let Some(info) = any.downcast_ref::<configuration::ClientInformation>() {
                debug!(peer = %self.peer, locale = %info.locale, view_distance = info.view_distance, "client information");
            } else if let Some(message) =
                any.downcast_ref::<configuration::ServerboundPluginMessage>()
            {
                debug!(peer = %self.peer, channel = %message.channel, len = message.data.len(), "plugin message");
            } else if let Some(echo) =
                any.downcast_ref::<configuration::ServerboundConfigKeepAlive>()
            {
                self.check_keepalive_echo(echo.id)?;
            } else if any
                .downcast_ref::<configuration::FinishConfigurationAck>()
                .is_some()
            {
                debug!(peer = %self.peer, "configuration finished");
                return Ok(());
            } else {
                return Err(ConnectionError::StateViolation {
                    state: self.state,
                    id: packet.packet_id(),
                });
            }
        }
    }

    async fn handle_play(&mut self) -> Result<PlayOutcome> {
        self.pending_keepalive = None;
        self.awaiting_config_ack = false;
        let timeout = Duration::from_secs(self.ctx.config.keep_alive_timeout_secs);

        loop {
            if let Some((_, sent_at)) = self.pending_keepalive {
                if sent_at.elapsed() > timeout {
                    return Err(ConnectionError::KeepAlive("echo timed out".to_string()));
                }
            }

            let commands = self
                .commands
                .as_mut()
                .expect("play state without a session channel");
            let event = tokio::select! {
                command = commands.recv() => PlayEvent::Command(command),
                raw = self.reader.read_packet() => PlayEvent::Inbound(raw),
            };

            match event {
                PlayEvent::Command(Some(SessionCommand::KeepAlive(id))) => {
                    // One echo outstanding at a time. Ticks that land while
                    // the client still owes an echo are dropped, so every id
                    // the client sees has a matching pending slot.
                    if self.pending_keepalive.is_none() {
                        self.writer
                            .write_packet(&play::ClientboundKeepAlive { id })
                            .await?;
                        self.pending_keepalive = Some((id, Instant::now()));
                    }
                }
                PlayEvent::Command(Some(SessionCommand::Disconnect(reason))) => {
                    let packet = play::PlayDisconnect::with_text(&reason);
                    self.writer.write_packet(&packet).await?;
                    return Err(ConnectionError::Disconnected(reason));
                }
                PlayEvent::Command(Some(SessionCommand::Reconfigure)) => {
                    self.writer.write_packet(&play::StartConfiguration).await?;
                    self.awaiting_config_ack = true;
                }
                PlayEvent::Command(None) => return Ok(PlayOutcome::Closed),
                PlayEvent::Inbound(raw) => {
                    let raw = match raw? {
                        Some(raw) => raw,
                        None => return Ok(PlayOutcome::Closed),
                    };
                    if let Some(outcome) = self.handle_play_packet(raw)? {
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    fn handle_play_packet(&mut self, raw: RawPacket) -> Result<Option<PlayOutcome>> {
        match self
            .ctx
            .packets
            .create(self.state, Direction::Serverbound, raw.id)
        {
            Some(mut packet) => {
                decode_into(&mut *packet, &raw)?;
                let any = packet.as_any();
                if let Some(echo) = any.downcast_ref::<play::ServerboundKeepAlive>() {
                    self.check_keepalive_echo(echo.id)?;
                    Ok(None)
                } else if any.downcast_ref::<play::ConfigurationAck>().is_some() {
                    if !self.awaiting_config_ack {
                        return Err(ConnectionError::StateViolation {
                            state: self.state,
                            id: raw.id,
                        });
                    }
                    self.awaiting_config_ack = false;
                    Ok(Some(PlayOutcome::Reconfigure))
                } else {
                    warn!(id = %format_args!("{:#04x}", raw.id), "unhandled known packet");
                    Ok(None)
                }
            }
            None => {
                debug!(id = %format_args!("{:#04x}", raw.id), state = %self.state, "skipping unknown packet");
                Ok(None)
            }
        }
    }

    fn check_keepalive_echo(&mut self, id: i64) -> Result<()> {
        match self.pending_keepalive.take() {
            Some((expected, _)) if expected == id => Ok(()),
            Some((expected, _)) => Err(ConnectionError::KeepAlive(format!(
                "echoed {id}, expected {expected}"
            ))),
            None => Err(ConnectionError::KeepAlive("unsolicited echo".to_string())),
        }
    }
}

enum PlayOutcome {
    Reconfigure,
    Closed,
}

enum PlayEvent {
    Command(Option<SessionCommand>),
    Inbound(Result<Option<RawPacket>>),
}

fn decode_into(packet: &mut dyn Packet, raw: &RawPacket) -> Result<()> {
    let mut buf = PacketBuffer::from_slice(&raw.body);
    packet.read_from(&mut buf)?;
    Ok(())
}

/// The minimal dimension-type registry a vanilla-style client expects
/// before configuration can finish.
fn dimension_registry() -> Result<configuration::RegistryData> {
    let overworld = from_snbt(
        "{has_skylight:1b, has_ceiling:0b, natural:1b, ambient_light:0.0f, \
         min_y:-64, height:384, logical_height:384, coordinate_scale:1.0d}",
    )
    .map_err(|e| ConnectionError::Disconnected(e.to_string()))?;

    Ok(configuration::RegistryData {
        registry_id: "minecraft:dimension_type".to_string(),
        entries: vec![configuration::RegistryEntry {
            entry_id: "minecraft:overworld".to_string(),
            data: Some(overworld),
        }],
    })
}
