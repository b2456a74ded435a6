//! The zlib stage between packet payloads and frames.
//!
//! Once enabled with a threshold, every payload is wrapped: a zero VarInt
//! marker followed by the raw payload when it is below the threshold, or the
//! uncompressed length followed by the zlib stream when at or above it. A
//! nonzero declared length below the threshold is a protocol violation.

use bytes::BytesMut;
use libdeflater::{CompressionLvl, Compressor, Decompressor};

use andesite_protocol::VarInt;

use crate::error::{ConnectionError, Result, MAX_FRAME_LEN};

/// Wraps `payload` for a connection compressing at `threshold`.
pub fn compress_payload(payload: &[u8], threshold: i32) -> Result<BytesMut> {
    let mut out = BytesMut::new();
    if payload.len() >= threshold.max(0) as usize {
        let mut compressor = Compressor::new(CompressionLvl::default());
        let bound = compressor.zlib_compress_bound(payload.len());
        let mut compressed = vec![0; bound];
        let actual = compressor
            .zlib_compress(payload, &mut compressed)
            .map_err(|e| {
                ConnectionError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;
        compressed.truncate(actual);

        VarInt(payload.len() as i32).write_to_bytes(&mut out);
        out.extend_from_slice(&compressed);
    } else {
        VarInt(0).write_to_bytes(&mut out);
        out.extend_from_slice(payload);
    }
    Ok(out)
}

/// Unwraps a compressed-stage frame body back into the raw payload.
pub fn decompress_payload(body: &[u8], threshold: i32) -> Result<BytesMut> {
    let (VarInt(declared), marker_len) = VarInt::read_from(body)?;
    let rest = &body[marker_len..];

    if declared == 0 {
        return Ok(BytesMut::from(rest));
    }
    if declared < 0 || (declared as usize) > MAX_FRAME_LEN {
        return Err(ConnectionError::FrameTooLarge {
            len: declared.max(0) as usize,
        });
    }
    if declared < threshold {
        return Err(ConnectionError::ThresholdViolation {
            len: declared as usize,
            threshold,
        });
    }

    let declared = declared as usize;
    let mut out = vec![0; declared];
    let actual = Decompressor::new()
        .zlib_decompress(rest, &mut out)
        .map_err(|e| {
            ConnectionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            ))
        })?;
    if actual != declared {
        return Err(ConnectionError::DecompressionMismatch {
            declared,
            actual,
        });
    }
    Ok(BytesMut::from(&out[..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_payload_passes_through_with_zero_marker() {
        let payload = b"tiny";
        let wrapped = compress_payload(payload, 256).unwrap();
        assert_eq!(wrapped[0], 0);
        assert_eq!(&wrapped[1..], payload);

        let unwrapped = decompress_payload(&wrapped, 256).unwrap();
        assert_eq!(&unwrapped[..], payload);
    }

    #[test]
    fn large_payload_round_trips_through_zlib() {
        let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let wrapped = compress_payload(&payload, 256).unwrap();
        // Declared length precedes the zlib stream.
        let (VarInt(declared), _) = VarInt::read_from(&wrapped).unwrap();
        assert_eq!(declared as usize, payload.len());
        assert!(wrapped.len() < payload.len());

        let unwrapped = decompress_payload(&wrapped, 256).unwrap();
        assert_eq!(&unwrapped[..], &payload[..]);
    }

    #[test]
    fn nonzero_length_below_threshold_is_rejected() {
        let payload: Vec<u8> = (0..300u32).map(|i| (i % 7) as u8).collect();
        let wrapped = compress_payload(&payload, 256).unwrap();

        // A peer claiming a compressed payload under its own threshold lies.
        let err = decompress_payload(&wrapped, 1024).unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::ThresholdViolation { len: 300, threshold: 1024 }
        ));
    }

    #[test]
    fn declared_length_mismatch_is_rejected() {
        let payload: Vec<u8> = vec![7; 512];
        let wrapped = compress_payload(&payload, 256).unwrap();

        // Rewrite the declared length to something smaller.
        let (_, marker_len) = VarInt::read_from(&wrapped).unwrap();
        let mut forged = BytesMut::new();
        VarInt(256).write_to_bytes(&mut forged);
        forged.extend_from_slice(&wrapped[marker_len..]);

        assert!(decompress_payload(&forged, 256).is_err());
    }
}
