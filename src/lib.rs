// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
NTP wire codec and timestamp conversion for the timewarp time server.

This crate provides the bit-exact 48-byte NTPv3/v4 packet representation
shared by the `timewarp-server` crate and any tooling that needs to speak
the protocol. It deliberately contains no networking: parsing and
serialization operate on in-memory buffers only.

# Example

Build a client-mode request and round-trip it through the wire format:

```rust
use timewarp::protocol::{Mode, Packet, Version};
use timewarp::unix_time::Instant;

let request = Packet {
    mode: Mode::Client,
    version: Version::V3,
    transmit_timestamp: Instant::now().into(),
    ..Packet::default()
};
let bytes = request.to_bytes().unwrap();
let parsed = Packet::from_bytes(&bytes).unwrap();
assert_eq!(parsed, request);
```
*/

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Custom error types for buffer-based NTP packet parsing.
pub mod error;
pub mod protocol;
/// Unix time conversion utilities for NTP timestamps.
///
/// Provides the `Instant` type for converting between NTP timestamps
/// (seconds since 1900-01-01) and Unix timestamps (seconds since 1970-01-01).
pub mod unix_time;
