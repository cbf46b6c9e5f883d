// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The UDP request loop.
//!
//! A dedicated task reads datagrams and stamps the receive instant before
//! anything else happens; each datagram is then handed to a spawned handler
//! task so the read loop never blocks on request processing. Handlers are
//! fire-and-forget: any failure is logged and the request dropped.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::UdpSocket;

use timewarp::protocol::{ConstPackedSizeBytes, Packet};
use timewarp::unix_time::Instant;

use crate::response::{build_response, serialize_response_with_t3};
use crate::state::SharedState;

/// The NTP server. Binds a UDP socket and answers client requests with
/// timestamps from whichever timer the routing table selects for the
/// client's source address.
pub struct NtpServer {
    sock: Arc<UdpSocket>,
    state: SharedState,
}

impl NtpServer {
    /// Resolve `host:port` and bind the listening socket.
    ///
    /// Bind failure is fatal for the daemon; the caller terminates with the
    /// returned diagnostic.
    pub async fn bind(host: &str, port: u16, state: SharedState) -> io::Result<NtpServer> {
        let sock = UdpSocket::bind((host, port)).await?;
        Ok(NtpServer {
            sock: Arc::new(sock),
            state,
        })
    }

    /// The local address the server is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    /// Serve requests until the socket fails.
    ///
    /// A read error is treated as fatal: it is not expected in normal
    /// operation and is how the loop observes its socket being closed
    /// during shutdown.
    pub async fn run(self) -> io::Result<()> {
        info!("ntp server listening on {}", self.sock.local_addr()?);

        loop {
            // A 48-byte buffer; the kernel truncates larger datagrams, which
            // discards NTPv4 extension fields we would ignore anyway.
            let mut data = [0u8; Packet::PACKED_SIZE_BYTES];
            let (len, remote) = self.sock.recv_from(&mut data).await?;

            // Capture the receive timestamp before any further processing;
            // T2 accuracy depends on it.
            let rx_timestamp = Instant::now();

            debug!("read {} bytes of data from {}", len, remote);

            // Handle the request in the background so the read loop can wait
            // for the next datagram.
            let sock = Arc::clone(&self.sock);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                handle_request(sock, state, remote, data, len, rx_timestamp).await;
            });
        }
    }
}

/// Handle a single request datagram: decode, route, synthesize, reply.
async fn handle_request(
    sock: Arc<UdpSocket>,
    state: SharedState,
    remote: SocketAddr,
    data: [u8; Packet::PACKED_SIZE_BYTES],
    len: usize,
    rx_timestamp: Instant,
) {
    let mut request = match Packet::from_bytes(&data[..len]) {
        Ok(packet) => packet,
        Err(e) => {
            warn!("dropping request from {}: {}", remote, e);
            return;
        }
    };

    request.receive_timestamp = rx_timestamp.into();
    debug!("read ntp request {}", request);

    // Snapshot the routed timer under the read lock, then release it before
    // serialization and I/O.
    let snapshot = {
        let state = match state.read() {
            Ok(guard) => guard,
            Err(_) => {
                error!("state lock poisoned; dropping request from {}", remote);
                return;
            }
        };
        state.resolve(remote.ip())
    };
    let Some(clock) = snapshot else {
        // Unreachable with the bootstrap default routes in place.
        error!("no route found for {}; dropping request", remote);
        return;
    };

    let response = build_response(
        &request,
        &clock.template,
        clock.now(),
        request.receive_timestamp,
    );

    // Sample T3 from the routed timer as late as possible.
    let buf = match serialize_response_with_t3(&response, clock.now()) {
        Ok(buf) => buf,
        Err(e) => {
            error!("failed to serialize response for {}: {}", remote, e);
            return;
        }
    };

    debug!("write ntp response to {}", remote);
    if let Err(e) = sock.send_to(&buf, remote).await {
        error!("failed to send response to {}: {}", remote, e);
    }
}
