// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The timewarp daemon: NTP server, 1 Hz ticker, and control plane.

use std::io;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};
use tokio::sync::watch;

use timewarp_server::api;
use timewarp_server::config::Config;
use timewarp_server::server::NtpServer;
use timewarp_server::state::ServerState;
use timewarp_server::ticker;
use timewarp_server::timer::ReplyTemplate;

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level.into())
        .init();

    // The default timer answers with the host clock for every client until
    // the operator routes networks elsewhere.
    let state = ServerState::bootstrap(ReplyTemplate::default()).shared();

    // Bind both listeners up front; either failure is fatal.
    let ntp_server = match NtpServer::bind(&config.ntp_host, config.ntp_port, state.clone()).await
    {
        Ok(server) => server,
        Err(e) => {
            error!("failed to bind ntp server on {}: {}", config.ntp_addr(), e);
            return Err(e);
        }
    };
    let web_listener = match tokio::net::TcpListener::bind(config.web_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind web server on {}: {}", config.web_addr(), e);
            return Err(e);
        }
    };
    info!("web server listening on {}", web_listener.local_addr()?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // The NTP read loop; aborted on shutdown, which closes the socket.
    let ntp_task = tokio::spawn(ntp_server.run());

    // Advance virtual clocks once per second.
    let ticker_task = ticker::spawn(state.clone(), shutdown_rx.clone());

    // The control plane drains in-flight requests when shutdown is signaled.
    let mut web_shutdown = shutdown_rx;
    let web_server = axum::serve(web_listener, api::router(state)).with_graceful_shutdown(
        async move {
            let _ = web_shutdown.changed().await;
        },
    );
    let web_task = tokio::spawn(async move { web_server.await });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // Stop the ticker and start draining the control plane, bounded by a
    // ten second deadline.
    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(Duration::from_secs(10), web_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!("web server failed: {}", e),
        Ok(Err(e)) => error!("web server task panicked: {}", e),
        Err(_) => warn!("web server drain deadline exceeded"),
    }

    // Tear down the NTP loop by dropping its socket.
    ntp_task.abort();
    let _ = ticker_task.await;

    info!("shutdown complete");
    Ok(())
}
