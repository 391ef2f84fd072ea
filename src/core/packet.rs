//! # Packet Builder/Parser
//!
//! Two wire variants share the same size prefix and type field:
//!
//! ```text
//! plain:     [TotalSize(4)] [Type(4)] [Checksum(4)] [Payload(N)]
//! encrypted: [TotalSize(4)] [Type(4)] [IV(16)] [Checksum(4)] [Ciphertext(N)]
//! ```
//!
//! All integers are little-endian u32. `TotalSize` counts every byte after the
//! size field itself. The checksum covers the body that follows it: the
//! payload for plain packets, the ciphertext for encrypted ones.
//!
//! The scheme is never inferred from the bytes. Callers pick it per packet type,
//! typically through [`PacketRegistry`](crate::protocol::registry::PacketRegistry).
//!
//! Building and parsing are all-or-nothing: on error no partial packet escapes.

use crate::config::{
    CHECKSUM_LEN, ENCRYPTED_HEADER_LEN, IV_LEN, MAX_PACKET_SIZE, PLAIN_HEADER_LEN,
    SIZE_FIELD_LEN, TYPE_FIELD_LEN,
};
use crate::core::checksum::{checksum, crc32c_value};
use crate::error::{ProtocolError, Result};
use crate::utils::crypto;
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// How a packet type is protected on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketScheme {
    /// Checksum over the payload, payload in the clear
    Plain,
    /// Payload encrypted, checksum over the ciphertext, IV carried in the header
    Encrypted,
}

impl PacketScheme {
    /// Fixed bytes between the size field and the body
    pub const fn header_len(self) -> usize {
        match self {
            PacketScheme::Plain => PLAIN_HEADER_LEN,
            PacketScheme::Encrypted => ENCRYPTED_HEADER_LEN,
        }
    }
}

/// The two fields common to both wire variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub total_size: u32,
    pub packet_type: u32,
}

impl PacketHeader {
    /// Length of the whole wire message, size field included
    pub fn wire_len(&self) -> usize {
        SIZE_FIELD_LEN.saturating_add(self.total_size as usize)
    }
}

/// Read the size and type fields without validating the rest of the packet.
///
/// # Errors
/// Returns `ProtocolError::TruncatedPacket` if fewer than 8 bytes are available.
pub fn peek_header(bytes: &[u8]) -> Result<PacketHeader> {
    let needed = SIZE_FIELD_LEN + TYPE_FIELD_LEN;
    if bytes.len() < needed {
        return Err(ProtocolError::TruncatedPacket {
            declared: needed,
            available: bytes.len(),
        });
    }
    let mut cursor = bytes;
    Ok(PacketHeader {
        total_size: cursor.get_u32_le(),
        packet_type: cursor.get_u32_le(),
    })
}

/// Lay out `type ∥ [iv] ∥ checksum ∥ body` behind its size prefix.
fn frame(
    packet_type: u32,
    iv: Option<&[u8]>,
    crc: [u8; CHECKSUM_LEN],
    body: &[u8],
) -> Result<Vec<u8>> {
    let header_len = TYPE_FIELD_LEN + iv.map_or(0, <[u8]>::len) + CHECKSUM_LEN;
    let total_size = header_len + body.len();
    if total_size > MAX_PACKET_SIZE {
        return Err(ProtocolError::OversizedPacket(total_size));
    }

    let mut out = Vec::with_capacity(SIZE_FIELD_LEN + total_size);
    out.put_u32_le(total_size as u32);
    out.put_u32_le(packet_type);
    if let Some(iv) = iv {
        out.put_slice(iv);
    }
    out.put_slice(&crc);
    out.put_slice(body);
    Ok(out)
}

/// Validate the size prefix and return the `total_size` bytes that follow it.
fn frame_body(bytes: &[u8], scheme: PacketScheme) -> Result<&[u8]> {
    if bytes.len() < SIZE_FIELD_LEN {
        return Err(ProtocolError::TruncatedPacket {
            declared: SIZE_FIELD_LEN,
            available: bytes.len(),
        });
    }

    let declared = (&bytes[..SIZE_FIELD_LEN]).get_u32_le() as usize;
    if declared > MAX_PACKET_SIZE {
        return Err(ProtocolError::OversizedPacket(declared));
    }
    if declared < scheme.header_len() {
        return Err(ProtocolError::InvalidHeader);
    }

    let rest = &bytes[SIZE_FIELD_LEN..];
    if rest.len() < declared {
        return Err(ProtocolError::TruncatedPacket {
            declared,
            available: rest.len(),
        });
    }
    Ok(&rest[..declared])
}

fn verify_checksum(expected: u32, body: &[u8], packet_type: u32) -> Result<()> {
    let actual = crc32c_value(body);
    if actual != expected {
        warn!(packet_type, expected, actual, "Checksum mismatch");
        return Err(ProtocolError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// Build a plain packet: `[size][type][crc32c(payload)][payload]`.
///
/// # Errors
/// Returns `ProtocolError::OversizedPacket` if the packet would exceed `MAX_PACKET_SIZE`.
#[instrument(skip(payload), fields(payload_len = payload.len()), level = "debug")]
pub fn build_packet(payload: &[u8], packet_type: u32) -> Result<Vec<u8>> {
    let packet = frame(packet_type, None, checksum(payload), payload)?;
    debug!(wire_len = packet.len(), "Built plain packet");
    Ok(packet)
}

/// Build an encrypted packet: `[size][type][iv][crc32c(ciphertext)][ciphertext]`.
///
/// Encrypts first, checksums the ciphertext, then frames the ciphertext. The
/// plaintext never reaches the wire.
///
/// # Errors
/// - `ProtocolError::InvalidKeyMaterial` if the key is not 32 bytes or the IV not 16
/// - `ProtocolError::OversizedPacket` if the packet would exceed `MAX_PACKET_SIZE`
#[instrument(skip(payload, key, iv), fields(payload_len = payload.len()), level = "debug")]
pub fn build_encrypted_packet(
    payload: &[u8],
    packet_type: u32,
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>> {
    let ciphertext = crypto::encrypt(payload, key, iv)?;
    let packet = frame(packet_type, Some(iv), checksum(&ciphertext), &ciphertext)?;
    debug!(wire_len = packet.len(), "Built encrypted packet");
    Ok(packet)
}

/// Parse a plain packet into `(type, payload)`.
///
/// Bytes past the declared size are ignored.
///
/// # Errors
/// - `ProtocolError::TruncatedPacket` if the buffer holds less than the declared size
/// - `ProtocolError::InvalidHeader` if the declared size cannot hold the fixed header
/// - `ProtocolError::OversizedPacket` if the declared size exceeds `MAX_PACKET_SIZE`
/// - `ProtocolError::ChecksumMismatch` if the payload does not match its checksum
#[instrument(skip(bytes), fields(len = bytes.len()), level = "debug")]
pub fn parse_packet(bytes: &[u8]) -> Result<(u32, Vec<u8>)> {
    let mut body = frame_body(bytes, PacketScheme::Plain)?;
    let packet_type = body.get_u32_le();
    let expected = body.get_u32_le();
    verify_checksum(expected, body, packet_type)?;

    debug!(packet_type, payload_len = body.len(), "Parsed plain packet");
    Ok((packet_type, body.to_vec()))
}

/// Parse an encrypted packet into `(type, plaintext)`.
///
/// The checksum is checked against the ciphertext before any decryption is
/// attempted.
///
/// # Errors
/// - `ProtocolError::InvalidKeyMaterial` if the key is not 32 bytes
/// - `ProtocolError::TruncatedPacket`, `InvalidHeader`, `OversizedPacket` as for [`parse_packet`]
/// - `ProtocolError::ChecksumMismatch` if the ciphertext does not match its checksum
/// - `ProtocolError::PaddingOrIntegrityError` if decryption yields invalid padding
#[instrument(skip(bytes, key), fields(len = bytes.len()), level = "debug")]
pub fn parse_encrypted_packet(bytes: &[u8], key: &[u8]) -> Result<(u32, Vec<u8>)> {
    let mut body = frame_body(bytes, PacketScheme::Encrypted)?;
    let packet_type = body.get_u32_le();
    let (iv, mut rest) = body.split_at(IV_LEN);
    crypto::validate_key_material(key, iv)?;
    let expected = rest.get_u32_le();
    verify_checksum(expected, rest, packet_type)?;

    let plaintext = crypto::decrypt(rest, key, iv)?;
    debug!(packet_type, payload_len = plaintext.len(), "Parsed encrypted packet");
    Ok((packet_type, plaintext))
}

/// Parse with an explicitly chosen scheme.
///
/// # Errors
/// As the scheme's parser; additionally `ProtocolError::InvalidKeyMaterial` when
/// the encrypted scheme is requested without a key.
pub fn parse_with_scheme(
    bytes: &[u8],
    scheme: PacketScheme,
    key: Option<&[u8]>,
) -> Result<(u32, Vec<u8>)> {
    match scheme {
        PacketScheme::Plain => parse_packet(bytes),
        PacketScheme::Encrypted => {
            let key = key.ok_or_else(crypto::missing_key)?;
            parse_encrypted_packet(bytes, key)
        }
    }
}
