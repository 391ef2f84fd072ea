use crate::config::TransportConfig;
use crate::core::codec::PacketCodec;
use crate::error::{ProtocolError, Result};
use crate::transport::Transport;
use crate::utils::timeout::with_timeout_error;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, instrument};

/// Packet transport over a byte stream (TCP, Unix socket, in-memory duplex).
pub struct FramedTransport<S> {
    framed: Framed<S, PacketCodec>,
    send_timeout: Duration,
    recv_timeout: Duration,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, config: &TransportConfig) -> Self {
        Self {
            framed: Framed::new(stream, PacketCodec::new(config.max_packet_size)),
            send_timeout: config.send_timeout,
            recv_timeout: config.recv_timeout,
        }
    }

    /// Set custom timeout durations
    pub fn with_timeouts(mut self, send_timeout: Duration, recv_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self.recv_timeout = recv_timeout;
        self
    }

    /// Recover the underlying stream, dropping any buffered partial frame.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}

impl<S> Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    #[instrument(skip(self, packet), fields(len = packet.len()), level = "debug")]
    async fn send(&mut self, packet: Bytes) -> Result<()> {
        let timeout = self.send_timeout;
        debug!(timeout_ms = ?timeout.as_millis(), "Sending packet with timeout");
        let framed = &mut self.framed;
        with_timeout_error(async move { framed.send(packet).await }, timeout).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn receive(&mut self) -> Result<Bytes> {
        let timeout = self.recv_timeout;
        debug!(timeout_ms = ?timeout.as_millis(), "Receiving packet with timeout");
        let framed = &mut self.framed;
        let frame = with_timeout_error(
            async move {
                framed
                    .next()
                    .await
                    .ok_or(ProtocolError::ConnectionClosed)?
            },
            timeout,
        )
        .await?;
        Ok(frame.freeze())
    }
}
