use aes::cipher::BlockEncryptMut;
use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use andesite_protocol::{encode_payload, Packet, VarInt};

use crate::compression::compress_payload;
use crate::encryption::{Aes128Cfb8Enc, Cfb8Closure};
use crate::error::{ConnectionError, Result, MAX_FRAME_LEN};

/// Outbound half of the pipeline: encodes, compresses, frames, and encrypts
/// last so the length prefix itself rides inside the cipher stream.
pub struct PacketWriter<W> {
    writer: W,
    encryption: Option<Aes128Cfb8Enc>,
    compression_threshold: Option<i32>,
}

impl<W: AsyncWrite + Unpin> PacketWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            encryption: None,
            compression_threshold: None,
        }
    }

    pub fn enable_encryption(&mut self, cipher: Aes128Cfb8Enc) {
        self.encryption = Some(cipher);
    }

    pub fn enable_compression(&mut self, threshold: i32) {
        self.compression_threshold = Some(threshold);
    }

    pub async fn write_packet(&mut self, packet: &dyn Packet) -> Result<()> {
        let payload = encode_payload(packet)?;

        let framed_payload = match self.compression_threshold {
            Some(threshold) => compress_payload(payload.as_bytes(), threshold)?,
            None => BytesMut::from(payload.as_bytes()),
        };

        if framed_payload.len() > MAX_FRAME_LEN {
            return Err(ConnectionError::FrameTooLarge {
                len: framed_payload.len(),
            });
        }

        let mut frame = BytesMut::new();
        VarInt(framed_payload.len() as i32).write_to_bytes(&mut frame);
        frame.extend_from_slice(&framed_payload);

        if let Some(cipher) = &mut self.encryption {
            cipher.encrypt_with_backend_mut(Cfb8Closure { data: &mut frame });
        }

        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use andesite_protocol::minecraft::java::status::PingRequest;
    use tokio::io::BufWriter;

    #[tokio::test]
    async fn frames_carry_length_then_id_then_body() {
        let mut writer = PacketWriter::new(BufWriter::new(Vec::new()));
        writer
            .write_packet(&PingRequest { payload: 1 })
            .await
            .unwrap();
        writer.writer.flush().await.unwrap();

        let written = writer.writer.into_inner();
        assert_eq!(written[0], 9); // length: id byte + 8 payload bytes
        assert_eq!(written[1], 0x01); // ping id
        assert_eq!(&written[2..], &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[tokio::test]
    async fn compressed_frames_survive_a_reader_round_trip() {
        use crate::io::PacketReader;
        use andesite_protocol::minecraft::java::login::LoginDisconnect;

        let (client, server) = tokio::io::duplex(1 << 16);
        let mut writer = PacketWriter::new(client);
        writer.enable_compression(8);

        let sent = LoginDisconnect::with_text("a reason long enough to compress");
        writer.write_packet(&sent).await.unwrap();

        let mut reader = PacketReader::new(server);
        reader.enable_compression(8);
        let raw = reader.read_packet().await.unwrap().unwrap();
        assert_eq!(raw.id, LoginDisconnect::ID);
    }

    #[tokio::test]
    async fn encrypted_frames_survive_a_reader_round_trip() {
        use crate::encryption::create_ciphers;
        use crate::io::PacketReader;

        let secret = [9u8; 16];
        let (enc, dec) = create_ciphers(&secret).unwrap();

        let (client, server) = tokio::io::duplex(1 << 16);
        let mut writer = PacketWriter::new(client);
        writer.enable_encryption(enc);

        writer
            .write_packet(&PingRequest { payload: -7 })
            .await
            .unwrap();

        let mut reader = PacketReader::new(server);
        reader.enable_encryption(dec);
        let raw = reader.read_packet().await.unwrap().unwrap();
        assert_eq!(raw.id, PingRequest::ID);
        assert_eq!(&raw.body[..], &(-7i64).to_be_bytes());
    }
}
