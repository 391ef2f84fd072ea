//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging, metrics, and timing.
//!
//! ## Components
//! - **Crypto**: AES-256-CBC cipher envelope and session key handling
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe packet counters
//! - **Timeout**: Async timeout wrappers for the transport layer
//!
//! ## Security
//! - Cryptographically secure RNG (getrandom) for IVs
//! - Memory zeroing for key material (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod metrics;
pub mod timeout;
