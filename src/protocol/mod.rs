//! # Protocol Layer
//!
//! Collaborators that sit above the packet core.
//!
//! ## Components
//! - **Registry**: explicit packet type to scheme mapping
//! - **Key Agreement**: X25519 session key derivation

pub mod key_agreement;
pub mod registry;
