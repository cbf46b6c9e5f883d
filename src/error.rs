// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for buffer-based NTP packet parsing.

use std::fmt;
use std::io;

/// Errors that can occur while parsing an NTP packet from raw bytes.
///
/// The wire format is fixed-size, so the only way a datagram can fail to
/// parse is by being shorter than the 48-byte packet header. Every bit
/// pattern within those 48 bytes decodes to a valid packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The buffer is too short for a full NTP packet.
    TooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooShort { needed, available } => {
                write!(
                    f,
                    "ntp packet too short: needed {} bytes, got {}",
                    needed, available
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for io::Error {
    fn from(err: ParseError) -> io::Error {
        io::Error::new(io::ErrorKind::UnexpectedEof, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_too_short() {
        let err = ParseError::TooShort {
            needed: 48,
            available: 16,
        };
        assert_eq!(
            err.to_string(),
            "ntp packet too short: needed 48 bytes, got 16"
        );
    }

    #[test]
    fn test_into_io_error() {
        let err = ParseError::TooShort {
            needed: 48,
            available: 0,
        };
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
