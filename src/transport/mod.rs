//! # Transport Layer
//!
//! The byte-moving collaborator. The packet core never touches a socket; it
//! hands finished wire packets to a [`Transport`] and receives whole packets
//! back from it.
//!
//! ## Components
//! - **Transport**: the `send`/`receive` seam
//! - **Framed**: any `AsyncRead + AsyncWrite` stream split into packets by
//!   [`PacketCodec`](crate::core::codec::PacketCodec), with per-call timeouts

pub mod framed;

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;

/// Moves whole wire packets between two endpoints.
pub trait Transport {
    /// Send one complete wire packet.
    fn send(&mut self, packet: Bytes) -> impl Future<Output = Result<()>> + Send;

    /// Receive the next complete wire packet.
    ///
    /// Returns `ProtocolError::ConnectionClosed` once the peer has gone away.
    fn receive(&mut self) -> impl Future<Output = Result<Bytes>> + Send;
}

pub use framed::FramedTransport;
