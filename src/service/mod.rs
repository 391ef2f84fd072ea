//! # Service Layer
//!
//! `SecureChannel` ties the packet core, the scheme registry, a session key and
//! a transport together into typed send/receive calls.

pub mod secure;

pub use secure::SecureChannel;
