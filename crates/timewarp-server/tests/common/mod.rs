// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared test helpers for server integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use timewarp::protocol::{ConstPackedSizeBytes, Mode, Packet, TimestampFormat, Version};
use timewarp::unix_time::Instant;
use timewarp_server::server::NtpServer;
use timewarp_server::state::SharedState;

/// Spawn a test server on an ephemeral loopback port and return its bound
/// address.
///
/// The server runs in a background tokio task and shuts down when the
/// runtime is dropped.
pub(crate) async fn spawn_test_server(state: SharedState) -> SocketAddr {
    let server = NtpServer::bind("127.0.0.1", 0, state)
        .await
        .expect("failed to bind test server");
    let addr = server.local_addr().expect("failed to get local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    // Small yield to ensure the server task is running.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// Build a minimal valid NTPv3 client request packet (48 bytes).
pub(crate) fn build_client_packet() -> [u8; Packet::PACKED_SIZE_BYTES] {
    build_client_packet_with_transmit(Instant::now().into())
}

/// Build a client request with a caller-chosen transmit timestamp, so tests
/// can match responses to requests by origin echo.
pub(crate) fn build_client_packet_with_transmit(
    transmit: TimestampFormat,
) -> [u8; Packet::PACKED_SIZE_BYTES] {
    let packet = Packet {
        mode: Mode::Client,
        version: Version::V3,
        transmit_timestamp: transmit,
        ..Packet::default()
    };
    packet.to_bytes().expect("failed to serialize")
}

/// Send a raw UDP packet to `addr` and receive the response with a timeout.
///
/// Returns `None` if the server doesn't respond within the timeout.
pub(crate) async fn send_receive_raw(
    addr: SocketAddr,
    packet: &[u8],
    timeout: Duration,
) -> Option<Vec<u8>> {
    let sock = UdpSocket::bind("127.0.0.1:0").await.expect("bind failed");
    sock.send_to(packet, addr).await.expect("send failed");

    let mut buf = [0u8; 256];
    match tokio::time::timeout(timeout, sock.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
        _ => None,
    }
}

/// Parse a response buffer as an NTP packet, asserting the 48-byte length.
#[allow(dead_code)]
pub(crate) fn parse_response(buf: &[u8]) -> Packet {
    assert_eq!(buf.len(), Packet::PACKED_SIZE_BYTES, "response size");
    Packet::from_bytes(buf).expect("failed to parse response")
}
