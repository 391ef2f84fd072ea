//! Stream framing for wire packets.
//!
//! `PacketCodec` cuts a byte stream into whole packets using the leading
//! `total_size` field. It does not verify checksums or decrypt; a decoded frame
//! is handed to the packet parser selected for its type.

use crate::config::{MAX_PACKET_SIZE, PLAIN_HEADER_LEN, SIZE_FIELD_LEN};
use crate::core::packet::peek_header;
use crate::error::{ProtocolError, Result};
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_packet_size: usize,
}

impl PacketCodec {
    /// Codec accepting frames whose `total_size` is at most `max_packet_size`.
    ///
    /// The limit is capped at `MAX_PACKET_SIZE`.
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            max_packet_size: max_packet_size.min(MAX_PACKET_SIZE),
        }
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(MAX_PACKET_SIZE)
    }
}

impl Decoder for PacketCodec {
    type Item = BytesMut;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < SIZE_FIELD_LEN {
            return Ok(None);
        }

        let declared = (&src[..SIZE_FIELD_LEN]).get_u32_le() as usize;
        if declared > self.max_packet_size {
            warn!(declared, limit = self.max_packet_size, "Rejecting oversized frame");
            return Err(ProtocolError::OversizedPacket(declared));
        }
        if declared < PLAIN_HEADER_LEN {
            return Err(ProtocolError::InvalidHeader);
        }

        let frame_len = SIZE_FIELD_LEN + declared;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        trace!(frame_len, "Decoded frame");
        Ok(Some(src.split_to(frame_len)))
    }
}

impl Encoder<Bytes> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        let header = peek_header(&item)?;
        if header.total_size as usize > self.max_packet_size {
            return Err(ProtocolError::OversizedPacket(header.total_size as usize));
        }
        if header.wire_len() != item.len() {
            return Err(ProtocolError::InvalidHeader);
        }

        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl Encoder<Vec<u8>> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Vec<u8>, dst: &mut BytesMut) -> Result<()> {
        Encoder::<Bytes>::encode(self, Bytes::from(item), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::{build_packet, parse_packet};

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_decode_waits_for_whole_frame() {
        let packet = build_packet(b"hello", 9).unwrap();
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::from(&packet[..7]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 7);

        buf.extend_from_slice(&packet[7..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());
        assert_eq!(parse_packet(&frame).unwrap(), (9, b"hello".to_vec()));
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let mut codec = PacketCodec::new(64);
        let mut buf = BytesMut::from(&65u32.to_le_bytes()[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::OversizedPacket(65))
        ));
    }

    #[test]
    fn test_decode_rejects_undersized_claim() {
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::from(&3u32.to_le_bytes()[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::InvalidHeader)
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_encode_rejects_mismatched_prefix() {
        let mut packet = build_packet(b"abc", 1).unwrap();
        packet.push(0);
        let mut codec = PacketCodec::default();
        let mut dst = BytesMut::new();
        assert!(matches!(
            codec.encode(Bytes::from(packet), &mut dst),
            Err(ProtocolError::InvalidHeader)
        ));
        assert!(dst.is_empty());
    }

    #[test]
    fn test_limit_capped() {
        assert_eq!(PacketCodec::new(usize::MAX).max_packet_size(), MAX_PACKET_SIZE);
    }
}
