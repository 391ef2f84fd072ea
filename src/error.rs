//! # Error Types
//!
//! Error handling for the packet protocol.
//!
//! Every failure the core can produce is a local, recoverable condition returned
//! to the caller. Whether a connection is dropped or a packet re-requested is the
//! transport's decision, never the core's.
//!
//! ## Error Categories
//! - **Framing**: truncated or malformed packets, oversized size claims
//! - **Integrity**: checksum mismatches
//! - **Cryptographic**: bad key material, invalid padding after decryption
//! - **Value codec**: size and layout-version mismatches
//! - **Transport**: I/O failures, closed streams, timeouts
//!
//! ## Example Usage
//! ```rust
//! use tranquility_protocol::core::packet::parse_packet;
//! use tranquility_protocol::error::ProtocolError;
//!
//! let err = parse_packet(&[0x01, 0x00]).unwrap_err();
//! assert!(matches!(err, ProtocolError::TruncatedPacket { .. }));
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry errors
    pub const ERR_SCHEME_CONFLICT: &str = "Packet type already registered with a different scheme";

    /// Key agreement errors
    pub const ERR_LOW_ORDER_POINT: &str = "Peer public key produced a non-contributory shared secret";

    /// Encrypted packet parsed without key material
    pub const ERR_MISSING_KEY: &str = "Encrypted packet requires a session key";

    /// Value codec errors
    pub const ERR_INVALID_BOOL: &str = "Invalid boolean byte";

    /// Random source errors
    pub const ERR_RNG_UNAVAILABLE: &str = "Operating system random source unavailable";
}

fn missing_key_hint(key_len: &usize) -> String {
    if *key_len == 0 {
        format!(": {}", constants::ERR_MISSING_KEY)
    } else {
        String::new()
    }
}

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key or IV of the wrong length.
    #[error("Invalid key material: key must be {expected_key} bytes and IV {expected_iv} bytes (got {key_len} and {iv_len}){}", missing_key_hint(.key_len))]
    InvalidKeyMaterial {
        expected_key: usize,
        expected_iv: usize,
        key_len: usize,
        iv_len: usize,
    },

    /// PKCS#7 padding did not survive decryption.
    #[error("Invalid padding after decryption")]
    PaddingOrIntegrityError,

    #[error("Checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Truncated packet: declared {declared} bytes, {available} available")]
    TruncatedPacket { declared: usize, available: usize },

    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid packet header")]
    InvalidHeader,

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Deserialize error: {0}")]
    DeserializeError(String),

    #[error("Unexpected packet type: {0}")]
    UnexpectedMessage(u32),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// True for errors caused by the bytes of a single packet rather than the
    /// connection carrying it. A transport may skip such a packet and continue.
    pub fn is_packet_local(&self) -> bool {
        matches!(
            self,
            ProtocolError::ChecksumMismatch { .. }
                | ProtocolError::PaddingOrIntegrityError
                | ProtocolError::SizeMismatch { .. }
                | ProtocolError::DeserializeError(_)
                | ProtocolError::UnexpectedMessage(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_display_is_hex() {
        let err = ProtocolError::ChecksumMismatch {
            expected: 0xDEAD_BEEF,
            actual: 0x1,
        };
        let text = err.to_string();
        assert!(text.contains("0xdeadbeef"));
        assert!(text.contains("0x00000001"));
    }

    #[test]
    fn test_packet_local_classification() {
        assert!(ProtocolError::PaddingOrIntegrityError.is_packet_local());
        assert!(ProtocolError::ChecksumMismatch {
            expected: 0,
            actual: 1
        }
        .is_packet_local());
        assert!(!ProtocolError::ConnectionClosed.is_packet_local());
        assert!(!ProtocolError::TruncatedPacket {
            declared: 10,
            available: 2
        }
        .is_packet_local());
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err: ProtocolError = io_err.into();
        assert!(matches!(err, ProtocolError::Io(_)));
    }
}
