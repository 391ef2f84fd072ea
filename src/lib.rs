//! # Tranquility Protocol
//!
//! A versioned binary packet protocol: typed messages framed with a size prefix,
//! integrity-checked with CRC-32C, and optionally sealed in an AES-256-CBC
//! envelope.
//!
//! ## Layers
//! - [`core`]: checksum, packet builder/parser, stream framing, value codec
//! - [`utils`]: cipher envelope, logging, metrics, timeouts
//! - [`protocol`]: packet type registry, X25519 key agreement
//! - [`transport`]: the `Transport` seam and a framed stream implementation
//! - [`service`]: `SecureChannel`, typed send/receive over a transport
//!
//! ## Quick Start
//! ```rust
//! use tranquility_protocol::{build_encrypted_packet, build_packet, parse_encrypted_packet, parse_packet};
//!
//! let wire = build_packet(&[0xFF; 4], 1).unwrap();
//! assert_eq!(parse_packet(&wire).unwrap(), (1, vec![0xFF; 4]));
//!
//! let key = [0x11u8; 32];
//! let iv = [0x22u8; 16];
//! let sealed = build_encrypted_packet(b"hello", 7, &key, &iv).unwrap();
//! assert_eq!(parse_encrypted_packet(&sealed, &key).unwrap(), (7, b"hello".to_vec()));
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::PROTOCOL_VERSION;
pub use crate::core::checksum::checksum;
pub use crate::core::packet::{
    build_encrypted_packet, build_packet, parse_encrypted_packet, parse_packet, PacketScheme,
};
pub use crate::core::serialization::{deserialize, serialize, FixedLayout};
pub use crate::error::{ProtocolError, Result};
pub use crate::utils::crypto::{decrypt, encrypt, KeyMaterial};
