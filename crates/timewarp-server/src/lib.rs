// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! A development NTP server that can answer different clients with
//! different clocks.
//!
//! The server keeps a registry of [`timer::Timer`] time sources (the host
//! clock, frozen instants, virtual clocks advancing once per second) and a
//! routing table mapping client networks to timers. Incoming NTP requests
//! are answered with timestamps from whichever timer the client's source
//! address routes to, while an HTTP/JSON control plane creates, retargets,
//! and deletes timers and routes at runtime.
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> std::io::Result<()> {
//! use timewarp_server::server::NtpServer;
//! use timewarp_server::state::ServerState;
//! use timewarp_server::timer::ReplyTemplate;
//!
//! let state = ServerState::bootstrap(ReplyTemplate::default()).shared();
//! let server = NtpServer::bind("localhost", 123, state).await?;
//! server.run().await
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The HTTP/JSON control plane for timers and routes.
pub mod api;
/// Daemon configuration from command-line flags and environment variables.
pub mod config;
/// Custom error types for the timer registry and routing table.
pub mod error;
/// The collection of registered timers.
pub mod registry;
mod response;
/// The routing table mapping client networks to timers.
pub mod routing;
/// The UDP request loop.
pub mod server;
/// Shared server state behind a single lock.
pub mod state;
/// The 1 Hz ticker that advances virtual clocks.
pub mod ticker;
/// Time sources for response generation.
pub mod timer;
