// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Response synthesis for incoming NTP requests.

use std::io;

use timewarp::protocol::{ConstPackedSizeBytes, Packet, TimestampFormat};
use timewarp::unix_time::Instant;

use crate::timer::ReplyTemplate;

/// Build an NTP server response packet for a client request.
///
/// Per RFC 5905 Section 8:
/// - header and metadata fields come from the routed timer's template
/// - `reference_timestamp` is the timer's idea of when its clock was set
/// - `origin_timestamp` echoes the client's `transmit_timestamp`
/// - `receive_timestamp` is T2, captured when the datagram arrived
/// - `transmit_timestamp` is left zero; the caller patches T3 just before
///   sending via [`serialize_response_with_t3`]
pub(crate) fn build_response(
    request: &Packet,
    template: &ReplyTemplate,
    reference: Instant,
    t2: TimestampFormat,
) -> Packet {
    Packet {
        leap_indicator: template.leap_indicator,
        version: template.version,
        mode: template.mode,
        stratum: template.stratum,
        poll: template.poll,
        precision: template.precision,
        root_delay: template.root_delay,
        root_dispersion: template.root_dispersion,
        reference_id: template.reference_id,
        reference_timestamp: reference.into(),
        origin_timestamp: request.transmit_timestamp,
        receive_timestamp: t2,
        transmit_timestamp: TimestampFormat::default(),
    }
}

/// Serialize a response packet and patch T3 (transmit timestamp) as late as
/// possible for maximum accuracy.
///
/// `t3` is sampled from the routed timer by the caller immediately before
/// this call. Returns the serialized buffer ready to send.
pub(crate) fn serialize_response_with_t3(
    response: &Packet,
    t3: Instant,
) -> io::Result<[u8; Packet::PACKED_SIZE_BYTES]> {
    let mut buf = response.to_bytes()?;

    // Patch T3 at offset 40..48.
    let t3: TimestampFormat = t3.into();
    buf[40..44].copy_from_slice(&t3.seconds.to_be_bytes());
    buf[44..48].copy_from_slice(&t3.fraction.to_be_bytes());

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use timewarp::protocol::{LeapIndicator, Mode, ReferenceId, Stratum, Version};

    fn test_request() -> Packet {
        Packet {
            mode: Mode::Client,
            version: Version::V3,
            transmit_timestamp: TimestampFormat {
                seconds: 3_913_056_000,
                fraction: 67_890,
            },
            ..Packet::default()
        }
    }

    fn test_template() -> ReplyTemplate {
        ReplyTemplate::default()
    }

    #[test]
    fn response_header_comes_from_template() {
        let template = test_template();
        let response = build_response(
            &test_request(),
            &template,
            Instant::new(1_704_067_200, 0),
            TimestampFormat::default(),
        );
        assert_eq!(response.leap_indicator, LeapIndicator::NoWarning);
        assert_eq!(response.version, Version::V3);
        assert_eq!(response.mode, Mode::Server);
        assert_eq!(response.stratum, Stratum::PRIMARY);
        assert_eq!(response.precision, template.precision);
        assert_eq!(response.reference_id, ReferenceId::new(*b"NICO"));
    }

    #[test]
    fn response_origin_is_client_transmit() {
        let request = test_request();
        let response = build_response(
            &request,
            &test_template(),
            Instant::new(0, 0),
            TimestampFormat::default(),
        );
        assert_eq!(response.origin_timestamp, request.transmit_timestamp);
    }

    #[test]
    fn response_receive_is_t2() {
        let t2 = TimestampFormat {
            seconds: 3_913_056_001,
            fraction: 999,
        };
        let response = build_response(&test_request(), &test_template(), Instant::new(0, 0), t2);
        assert_eq!(response.receive_timestamp, t2);
    }

    #[test]
    fn response_reference_is_timer_instant() {
        let reference = Instant::new(1_704_067_200, 0);
        let response = build_response(
            &test_request(),
            &test_template(),
            reference,
            TimestampFormat::default(),
        );
        let expected: TimestampFormat = reference.into();
        assert_eq!(response.reference_timestamp, expected);
    }

    #[test]
    fn serialize_patches_t3_bytes() {
        let response = build_response(
            &test_request(),
            &test_template(),
            Instant::new(1_704_067_200, 0),
            TimestampFormat::default(),
        );
        assert!(response.transmit_timestamp.is_zero());

        let t3 = Instant::new(1_704_067_201, 500_000_000);
        let buf = serialize_response_with_t3(&response, t3).unwrap();
        assert_eq!(buf.len(), 48);

        let parsed = Packet::from_bytes(&buf).unwrap();
        let expected: TimestampFormat = t3.into();
        assert_eq!(parsed.transmit_timestamp, expected);
        // Everything before T3 is untouched by the patch.
        assert_eq!(parsed.origin_timestamp, response.origin_timestamp);
        assert_eq!(parsed.receive_timestamp, response.receive_timestamp);
    }
}
