//! # Core Protocol Components
//!
//! Packet framing, integrity, and value encoding.
//!
//! ## Components
//! - **Checksum**: CRC-32C over packet bodies
//! - **Packet**: plain and encrypted wire formats
//! - **Codec**: Tokio codec that splits a byte stream into whole packets
//! - **Serialization**: fixed-layout value encoding for payloads
//!
//! ## Wire Format
//! ```text
//! plain:     [TotalSize(4)] [Type(4)] [Checksum(4)] [Payload(N)]
//! encrypted: [TotalSize(4)] [Type(4)] [IV(16)] [Checksum(4)] [Ciphertext(N)]
//! ```
//!
//! ## Security
//! - Maximum packet size: 16MB (size claims above it are refused before allocation)
//! - Checksums detect corruption, not tampering

pub mod checksum;
pub mod codec;
pub mod packet;
pub mod serialization;
