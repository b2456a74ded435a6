use aes::cipher::BlockDecryptMut;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use andesite_protocol::VarInt;

use crate::compression::decompress_payload;
use crate::encryption::{Aes128Cfb8Dec, Cfb8Closure};
use crate::error::{ConnectionError, Result, MAX_FRAME_LEN};
use crate::io::RawPacket;

// The maximum frame length fits in 21 bits, so a valid length prefix never
// needs a fourth VarInt byte.
const MAX_LENGTH_PREFIX_BYTES: usize = 3;

/// Inbound half of the pipeline: decrypts, splits frames, decompresses and
/// peels the packet id.
pub struct PacketReader<R> {
    reader: R,
    encryption: Option<Aes128Cfb8Dec>,
    compression_threshold: Option<i32>,
}

impl<R: AsyncRead + Unpin> PacketReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            encryption: None,
            compression_threshold: None,
        }
    }

    pub fn enable_encryption(&mut self, cipher: Aes128Cfb8Dec) {
        self.encryption = Some(cipher);
    }

    pub fn enable_compression(&mut self, threshold: i32) {
        self.compression_threshold = Some(threshold);
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    /// Reads the next frame. Returns `None` on a clean close between frames;
    /// an EOF inside a frame is [`ConnectionError::UnexpectedEof`].
    pub async fn read_packet(&mut self) -> Result<Option<RawPacket>> {
        // The length prefix arrives byte by byte; each byte may be encrypted.
        let mut length_bytes = [0u8; MAX_LENGTH_PREFIX_BYTES];
        let mut filled = 0;
        let frame_len = loop {
            let mut byte = [0u8; 1];
            match self.reader.read_exact(&mut byte).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    if filled == 0 {
                        return Ok(None);
                    }
                    return Err(ConnectionError::UnexpectedEof);
                }
                Err(e) => return Err(ConnectionError::Io(e)),
            }
            if let Some(cipher) = &mut self.encryption {
                cipher.decrypt_with_backend_mut(Cfb8Closure { data: &mut byte });
            }

            length_bytes[filled] = byte[0];
            filled += 1;
            if byte[0] & 0x80 == 0 {
                let (VarInt(len), _) = VarInt::read_from(&length_bytes[..filled])?;
                break len;
            }
            if filled == MAX_LENGTH_PREFIX_BYTES {
                return Err(ConnectionError::FrameTooLarge { len: MAX_FRAME_LEN + 1 });
            }
        };

        if frame_len <= 0 {
            return Err(ConnectionError::Protocol(
                andesite_protocol::ProtocolError::NegativeLength(frame_len),
            ));
        }
        let frame_len = frame_len as usize;
        if frame_len > MAX_FRAME_LEN {
            return Err(ConnectionError::FrameTooLarge { len: frame_len });
        }

        let mut frame = vec![0u8; frame_len];
        self.reader.read_exact(&mut frame).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ConnectionError::UnexpectedEof
            } else {
                ConnectionError::Io(e)
            }
        })?;
        if let Some(cipher) = &mut self.encryption {
            cipher.decrypt_with_backend_mut(Cfb8Closure { data: &mut frame });
        }

        let payload = match self.compression_threshold {
            Some(threshold) => decompress_payload(&frame, threshold)?,
            None => BytesMut::from(&frame[..]),
        };

        let (VarInt(id), id_len) = VarInt::read_from(&payload)?;
        Ok(Some(RawPacket {
            id,
            body: BytesMut::from(&payload[id_len..]),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn reads_a_simple_frame() {
        // [length=3][id=0][body 1 2]
        let data = vec![3, 0, 1, 2];
        let mut reader = PacketReader::new(BufReader::new(Cursor::new(data)));

        let packet = reader.read_packet().await.unwrap().unwrap();
        assert_eq!(packet.id, 0);
        assert_eq!(&packet.body[..], &[1, 2]);
        assert!(reader.read_packet().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn splitter_survives_single_byte_arrival() {
        let (client, server) = tokio::io::duplex(1);
        let mut reader = PacketReader::new(server);

        let feeder = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let mut client = client;
            for byte in [3u8, 0, 1, 2] {
                client.write_all(&[byte]).await.unwrap();
                client.flush().await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let packet = reader.read_packet().await.unwrap().unwrap();
        assert_eq!(packet.id, 0);
        assert_eq!(&packet.body[..], &[1, 2]);
        feeder.await.unwrap();
    }

    #[tokio::test]
    async fn eof_mid_frame_is_an_error() {
        // Length claims 10 bytes, only 2 follow.
        let data = vec![10, 0, 1];
        let mut reader = PacketReader::new(BufReader::new(Cursor::new(data)));
        assert!(matches!(
            reader.read_packet().await,
            Err(ConnectionError::UnexpectedEof)
        ));
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected_before_payload() {
        // 0xFF 0xFF 0xFF encodes a continuation past the 3-byte limit.
        let data = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        let mut reader = PacketReader::new(BufReader::new(Cursor::new(data)));
        assert!(matches!(
            reader.read_packet().await,
            Err(ConnectionError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn clean_eof_between_frames_is_none() {
        let data: Vec<u8> = Vec::new();
        let mut reader = PacketReader::new(BufReader::new(Cursor::new(data)));
        assert!(reader.read_packet().await.unwrap().is_none());
    }
}
