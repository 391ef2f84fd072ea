//! End-to-end tests: X25519 key agreement followed by typed packet exchange
//! over a real TCP connection.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tranquility_protocol::config::TransportConfig;
use tranquility_protocol::core::packet::PacketScheme;
use tranquility_protocol::error::ProtocolError;
use tranquility_protocol::fixed_layout;
use tranquility_protocol::protocol::key_agreement::{KeyAgreement, X25519KeyAgreement};
use tranquility_protocol::protocol::registry::PacketRegistry;
use tranquility_protocol::service::SecureChannel;
use tranquility_protocol::transport::{FramedTransport, Transport};
use tranquility_protocol::utils::metrics::Metrics;

const KEY_EXCHANGE: u32 = 0x01;
const HEARTBEAT: u32 = 0x02;
const CREDENTIALS: u32 = 0x10;
const POSITION: u32 = 0x11;

fixed_layout! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct PublicKeyMsg {
        key: [u8; 32],
    }
}

fixed_layout! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        entity: u32,
        x: f32,
        y: f32,
    }
}

fn registry() -> PacketRegistry {
    PacketRegistry::new()
        .with(KEY_EXCHANGE, PacketScheme::Plain)
        .unwrap()
        .with(HEARTBEAT, PacketScheme::Plain)
        .unwrap()
        .with(CREDENTIALS, PacketScheme::Encrypted)
        .unwrap()
        .with(POSITION, PacketScheme::Encrypted)
        .unwrap()
}

fn metrics() -> &'static Metrics {
    Box::leak(Box::new(Metrics::new()))
}

async fn connected_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, server) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (client.unwrap(), server.unwrap().0)
}

#[tokio::test]
async fn test_key_agreement_then_encrypted_exchange() {
    let (client_stream, server_stream) = connected_pair().await;
    let config = TransportConfig::default();

    let server = tokio::spawn(async move {
        let mut channel =
            SecureChannel::new(FramedTransport::new(server_stream, &config), registry())
                .with_metrics(metrics());

        let agreement = X25519KeyAgreement::generate();
        let (packet_type, peer) = channel.receive_value::<PublicKeyMsg>().await.unwrap();
        assert_eq!(packet_type, KEY_EXCHANGE);
        channel
            .send_value(
                KEY_EXCHANGE,
                &PublicKeyMsg {
                    key: agreement.public_key(),
                },
            )
            .await
            .unwrap();

        let key = agreement.derive_shared_key(&peer.key).unwrap();
        let mut channel = channel.with_key(key);

        let (packet_type, secret) = channel.receive().await.unwrap();
        assert_eq!(packet_type, CREDENTIALS);
        assert_eq!(secret, b"user:hunter2");

        let (packet_type, position) = channel.receive_value::<Position>().await.unwrap();
        assert_eq!(packet_type, POSITION);
        channel.send_value(POSITION, &position).await.unwrap();
    });

    let mut channel = SecureChannel::new(
        FramedTransport::new(client_stream, &TransportConfig::default()),
        registry(),
    )
    .with_metrics(metrics());

    let agreement = X25519KeyAgreement::generate();
    channel
        .send_value(
            KEY_EXCHANGE,
            &PublicKeyMsg {
                key: agreement.public_key(),
            },
        )
        .await
        .unwrap();
    let (_, peer) = channel.receive_value::<PublicKeyMsg>().await.unwrap();
    let mut channel = channel.with_key(agreement.derive_shared_key(&peer.key).unwrap());

    channel.send(CREDENTIALS, b"user:hunter2").await.unwrap();
    let position = Position {
        entity: 12,
        x: 3.5,
        y: -8.25,
    };
    channel.send_value(POSITION, &position).await.unwrap();

    let (packet_type, echoed) = channel.receive_value::<Position>().await.unwrap();
    assert_eq!(packet_type, POSITION);
    assert_eq!(echoed, position);

    server.await.unwrap();
}

#[tokio::test]
async fn test_corrupted_frame_does_not_poison_channel() {
    let (client_stream, server_stream) = connected_pair().await;
    let config = TransportConfig::default();
    let server_metrics = metrics();

    // Raw transport on the sending side so a corrupted frame can be injected
    let mut raw = FramedTransport::new(client_stream, &config);
    let mut channel = SecureChannel::new(FramedTransport::new(server_stream, &config), registry())
        .with_metrics(server_metrics);

    let mut bad = tranquility_protocol::build_packet(b"beat", HEARTBEAT).unwrap();
    let last = bad.len() - 1;
    bad[last] ^= 0xFF;
    raw.send(bad.into()).await.unwrap();

    let good = tranquility_protocol::build_packet(b"beat", HEARTBEAT).unwrap();
    raw.send(good.into()).await.unwrap();

    assert!(matches!(
        channel.receive().await,
        Err(ProtocolError::ChecksumMismatch { .. })
    ));
    assert_eq!(
        channel.receive().await.unwrap(),
        (HEARTBEAT, b"beat".to_vec())
    );

    let snap = server_metrics.snapshot();
    assert_eq!(snap.checksum_failures, 1);
    assert_eq!(snap.packets_received, 1);
}

#[tokio::test]
async fn test_peer_disconnect_reports_closed() {
    let (client_stream, server_stream) = connected_pair().await;
    let config = TransportConfig::default();
    let mut channel = SecureChannel::new(FramedTransport::new(server_stream, &config), registry());

    drop(client_stream);
    assert!(matches!(
        channel.receive().await,
        Err(ProtocolError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn test_receive_timeout() {
    let (_client_stream, server_stream) = connected_pair().await;
    let transport = FramedTransport::new(server_stream, &TransportConfig::default())
        .with_timeouts(Duration::from_secs(1), Duration::from_millis(50));
    let mut channel = SecureChannel::new(transport, registry());

    assert!(matches!(
        channel.receive().await,
        Err(ProtocolError::Timeout)
    ));
}
