use crate::core::packet::{build_encrypted_packet, build_packet, PacketScheme};
use crate::core::serialization::{deserialize, serialize, FixedLayout};
use crate::error::Result;
use crate::protocol::registry::PacketRegistry;
use crate::transport::Transport;
use crate::utils::crypto::{generate_iv, missing_key, KeyMaterial};
use crate::utils::metrics::{global_metrics, Metrics, Timer};

use bytes::Bytes;
use tracing::{debug, instrument, warn};

/// Typed packet exchange over a [`Transport`].
///
/// Each packet type is sent plain or encrypted according to the registry. Every
/// encrypted packet gets a fresh IV. The channel holds no state beyond the
/// session key; a failed packet leaves it usable for the next one.
pub struct SecureChannel<T> {
    transport: T,
    registry: PacketRegistry,
    key: Option<KeyMaterial>,
    metrics: &'static Metrics,
}

impl<T: Transport> SecureChannel<T> {
    pub fn new(transport: T, registry: PacketRegistry) -> Self {
        Self {
            transport,
            registry,
            key: None,
            metrics: global_metrics(),
        }
    }

    /// Attach the session key used for encrypted packet types.
    pub fn with_key(mut self, key: KeyMaterial) -> Self {
        self.key = Some(key);
        self
    }

    /// Record counters somewhere other than the global instance.
    pub fn with_metrics(mut self, metrics: &'static Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &PacketRegistry {
        &self.registry
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn key_bytes(&self) -> Option<&[u8]> {
        self.key.as_ref().map(|k| k.as_bytes().as_slice())
    }

    /// Build and send one packet of `packet_type`.
    ///
    /// # Errors
    /// - `ProtocolError::UnexpectedMessage` if the type is not registered
    /// - `ProtocolError::InvalidKeyMaterial` if the type is encrypted and no key is set
    /// - any transport error
    #[instrument(skip(self, payload), fields(payload_len = payload.len()), level = "debug")]
    pub async fn send(&mut self, packet_type: u32, payload: &[u8]) -> Result<()> {
        let _timer = Timer::start("channel_send");
        let scheme = self.registry.scheme_for(packet_type)?;

        let packet = match scheme {
            PacketScheme::Plain => build_packet(payload, packet_type)?,
            PacketScheme::Encrypted => {
                let key = self.key_bytes().ok_or_else(missing_key)?;
                let iv = generate_iv()?;
                build_encrypted_packet(payload, packet_type, key, &iv)?
            }
        };

        let wire_len = packet.len() as u64;
        self.transport.send(Bytes::from(packet)).await?;
        self.metrics.packet_sent(wire_len, scheme == PacketScheme::Encrypted);
        debug!(?scheme, wire_len, "Packet sent");
        Ok(())
    }

    /// Receive and open the next packet.
    ///
    /// # Errors
    /// Any parse error for the received packet, or a transport error.
    #[instrument(skip(self), level = "debug")]
    pub async fn receive(&mut self) -> Result<(u32, Vec<u8>)> {
        let frame = self.transport.receive().await?;
        match self.registry.parse(&frame, self.key_bytes()) {
            Ok((packet_type, payload)) => {
                let encrypted =
                    self.registry.scheme_for(packet_type)? == PacketScheme::Encrypted;
                self.metrics.packet_received(frame.len() as u64, encrypted);
                Ok((packet_type, payload))
            }
            Err(e) => {
                self.metrics.parse_failed(&e);
                warn!(error = %e, "Dropping unreadable packet");
                Err(e)
            }
        }
    }

    /// Encode `value` with the value codec and send it.
    pub async fn send_value<V: FixedLayout>(&mut self, packet_type: u32, value: &V) -> Result<()> {
        let payload = serialize(value);
        self.send(packet_type, &payload).await
    }

    /// Receive the next packet and decode its payload as a `V`.
    pub async fn receive_value<V: FixedLayout>(&mut self) -> Result<(u32, V)> {
        let (packet_type, payload) = self.receive().await?;
        Ok((packet_type, deserialize(&payload)?))
    }
}
