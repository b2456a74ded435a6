//! End-to-end exchanges over a loopback socket, using the crate's own
//! reader/writer pair as a scripted client.

use std::sync::Arc;

use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};

use andesite_protocol::minecraft::java::{configuration, handshake, login, play, status};
use andesite_protocol::{Packet, PacketBuffer};
use andesite_server::io::{PacketReader, PacketWriter, RawPacket};
use andesite_server::{handle_connection, ServerConfig, ServerContext};

struct Client {
    reader: PacketReader<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: PacketWriter<BufWriter<tokio::net::tcp::OwnedWriteHalf>>,
}

impl Client {
    fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: PacketReader::new(BufReader::new(read_half)),
            writer: PacketWriter::new(BufWriter::new(write_half)),
        }
    }

    async fn send(&mut self, packet: &dyn Packet) {
        self.writer.write_packet(packet).await.unwrap();
    }

    async fn recv(&mut self) -> RawPacket {
        self.reader.read_packet().await.unwrap().unwrap()
    }
}

fn decode<P: Packet + Default>(raw: &RawPacket) -> P {
    let mut packet = P::default();
    let mut buf = PacketBuffer::from_slice(&raw.body);
    packet.read_from(&mut buf).unwrap();
    assert!(buf.is_exhausted());
    packet
}

async fn spawn_server(config: ServerConfig) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let ctx = Arc::new(ServerContext::new(config));
    andesite_server::spawn_keepalive_ticker(
        ctx.sessions.clone(),
        std::time::Duration::from_secs(ctx.config.keep_alive_interval_secs),
    );
    tokio::spawn(async move {
        loop {
            let (stream, peer) = listener.accept().await.unwrap();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let _ = handle_connection(stream, peer, ctx).await;
            });
        }
    });
    addr
}

#[tokio::test]
async fn status_ping_round_trip() {
    let addr = spawn_server(ServerConfig {
        motd: "integration".to_string(),
        ..ServerConfig::default()
    })
    .await;

    let mut client = Client::new(TcpStream::connect(addr).await.unwrap());
    client
        .send(&handshake::Handshake::new(
            767,
            "localhost".to_string(),
            addr.port(),
            handshake::Handshake::STATE_STATUS,
        ))
        .await;
    client.send(&status::StatusRequest).await;

    let raw = client.recv().await;
    assert_eq!(raw.id, status::StatusResponse::ID);
    let response: status::StatusResponse = decode(&raw);
    let body: status::ServerStatus = serde_json::from_str(&response.json_response).unwrap();
    assert_eq!(body.description["text"], "integration");
    assert_eq!(body.players.online, 0);

    client.send(&status::PingRequest { payload: 1234 }).await;
    let raw = client.recv().await;
    let pong: status::PongResponse = decode(&raw);
    assert_eq!(pong.payload, 1234);
}

#[tokio::test]
async fn offline_login_reaches_configuration() {
    let addr = spawn_server(ServerConfig {
        online_mode: false,
        compression_threshold: 64,
        keep_alive_interval_secs: 1,
        ..ServerConfig::default()
    })
    .await;

    let mut client = Client::new(TcpStream::connect(addr).await.unwrap());
    client
        .send(&handshake::Handshake::new(
            767,
            "localhost".to_string(),
            addr.port(),
            handshake::Handshake::STATE_LOGIN,
        ))
        .await;
    client
        .send(&login::LoginStart {
            username: "Steve".to_string(),
            uuid: uuid::Uuid::nil(),
        })
        .await;

    // The server announces compression before anything else.
    let raw = client.recv().await;
    assert_eq!(raw.id, login::SetCompression::ID);
    let compression: login::SetCompression = decode(&raw);
    assert_eq!(compression.threshold, 64);
    client.reader.enable_compression(64);
    client.writer.enable_compression(64);

    let raw = client.recv().await;
    assert_eq!(raw.id, login::LoginSuccess::ID);
    let success: login::LoginSuccess = decode(&raw);
    assert_eq!(success.username, "Steve");
    // Offline identity is derived server-side, not echoed from login start.
    assert_ne!(success.uuid, uuid::Uuid::nil());

    client.send(&login::LoginAcknowledged).await;

    // Configuration opens with brand, registry data and the finish marker.
    let raw = client.recv().await;
    assert_eq!(raw.id, configuration::ClientboundPluginMessage::ID);
    let brand: configuration::ClientboundPluginMessage = decode(&raw);
    assert_eq!(brand.channel, "minecraft:brand");

    let raw = client.recv().await;
    assert_eq!(raw.id, configuration::RegistryData::ID);
    let registry: configuration::RegistryData = decode(&raw);
    assert_eq!(registry.registry_id, "minecraft:dimension_type");

    let raw = client.recv().await;
    assert_eq!(raw.id, configuration::FinishConfiguration::ID);

    client.send(&configuration::FinishConfigurationAck).await;
    // The session is live in Play now; a keep-alive will arrive within the
    // configured interval.
    let raw = client.recv().await;
    assert_eq!(raw.id, play::ClientboundKeepAlive::ID);
}

#[tokio::test]
async fn slow_keepalive_echo_keeps_session_alive() {
    let addr = spawn_server(ServerConfig {
        online_mode: false,
        compression_threshold: -1,
        keep_alive_interval_secs: 1,
        ..ServerConfig::default()
    })
    .await;

    let mut client = Client::new(TcpStream::connect(addr).await.unwrap());
    client
        .send(&handshake::Handshake::new(
            767,
            "localhost".to_string(),
            addr.port(),
            handshake::Handshake::STATE_LOGIN,
        ))
        .await;
    client
        .send(&login::LoginStart {
            username: "Alex".to_string(),
            uuid: uuid::Uuid::nil(),
        })
        .await;

    let raw = client.recv().await;
    assert_eq!(raw.id, login::LoginSuccess::ID);
    client.send(&login::LoginAcknowledged).await;

    let raw = client.recv().await;
    assert_eq!(raw.id, configuration::ClientboundPluginMessage::ID);
    let raw = client.recv().await;
    assert_eq!(raw.id, configuration::RegistryData::ID);
    let raw = client.recv().await;
    assert_eq!(raw.id, configuration::FinishConfiguration::ID);
    client.send(&configuration::FinishConfigurationAck).await;

    let raw = client.recv().await;
    assert_eq!(raw.id, play::ClientboundKeepAlive::ID);
    let ping: play::ClientboundKeepAlive = decode(&raw);

    // Sit through another tick before echoing. The server must not send a
    // second keep-alive while this one is still unanswered.
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    client.send(&play::ServerboundKeepAlive { id: ping.id }).await;

    // The late echo is accepted and the next tick carries a fresh id, so
    // the session survived.
    let raw = client.recv().await;
    assert_eq!(raw.id, play::ClientboundKeepAlive::ID);
    let next: play::ClientboundKeepAlive = decode(&raw);
    assert_ne!(next.id, ping.id);
    client.send(&play::ServerboundKeepAlive { id: next.id }).await;
}
