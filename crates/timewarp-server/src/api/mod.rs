// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The HTTP/JSON control plane.
//!
//! Exposes the timer registry and routing table for runtime inspection and
//! mutation. Error kinds map onto status codes: unknown ids are 404, subnet
//! collisions and in-use timers are 409, default-route deletion is 403, and
//! unparseable input is 400. Everything else the datapath needs keeps
//! running while handlers briefly take the shared state lock.

mod health;
mod routes;
mod timers;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{RegistryError, RoutingError};
use crate::routing::RouteEntry;
use crate::state::{ServerState, SharedState};
use crate::timer::Timer;
use timewarp::unix_time::Instant;

/// Build the control-plane router for the given shared state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .nest("/api/v1/healthcheck", health::router())
        .nest("/api/v1/timer", timers::router())
        .nest("/api/v1/route", routes::router())
        .with_state(state)
}

// ── JSON bodies ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TimerSummary {
    pub id: u32,
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TimerDetail {
    pub id: u32,
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TimerListResponse {
    pub length: usize,
    pub timers: Vec<TimerSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RouteDetail {
    pub id: u32,
    pub subnet: String,
    pub timer: TimerDetail,
}

#[derive(Debug, Serialize)]
pub(crate) struct RouteListResponse {
    pub length: usize,
    pub routes: Vec<RouteDetail>,
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Render an instant as RFC 3339 for the control-plane JSON.
pub(crate) fn rfc3339(at: Instant) -> String {
    match chrono::DateTime::from_timestamp(at.secs(), at.subsec_nanos()) {
        Some(datetime) => datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        None => String::from("out-of-range"),
    }
}

/// Parse an RFC 3339 string into an instant.
pub(crate) fn parse_rfc3339(s: &str) -> Option<Instant> {
    let datetime = chrono::DateTime::parse_from_rfc3339(s).ok()?;
    Some(Instant::new(
        datetime.timestamp(),
        datetime.timestamp_subsec_nanos(),
    ))
}

pub(crate) fn timer_detail(id: u32, timer: &Timer) -> TimerDetail {
    TimerDetail {
        id,
        kind: timer.kind().to_string(),
        value: rfc3339(timer.now()),
    }
}

pub(crate) fn route_detail(state: &ServerState, entry: &RouteEntry) -> RouteDetail {
    let timer = match state.timer(entry.timer_id) {
        Some(timer) => timer_detail(entry.timer_id, timer),
        // The in-use guard prevents dangling timer ids; still, never panic
        // in a reporting path.
        None => TimerDetail {
            id: entry.timer_id,
            kind: String::from("unknown"),
            value: String::new(),
        },
    };
    RouteDetail {
        id: entry.id,
        subnet: entry.net.to_string(),
        timer,
    }
}

pub(crate) fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
        .into_response()
}

pub(crate) fn lock_poisoned() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: String::from("state lock poisoned"),
        }),
    )
        .into_response()
}

pub(crate) fn registry_error(err: RegistryError) -> Response {
    let status = match err {
        RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
        RegistryError::InUse { .. } => StatusCode::CONFLICT,
        RegistryError::Immutable { .. } => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorResponse {
            message: err.to_string(),
        }),
    )
        .into_response()
}

pub(crate) fn routing_error(err: RoutingError) -> Response {
    let status = match err {
        RoutingError::NotFound { .. } => StatusCode::NOT_FOUND,
        RoutingError::DuplicateNetwork { .. } => StatusCode::CONFLICT,
        RoutingError::DefaultRoute { .. } => StatusCode::FORBIDDEN,
        RoutingError::UnknownTimer { .. } => StatusCode::NOT_FOUND,
    };
    (
        status,
        Json(ErrorResponse {
            message: err.to_string(),
        }),
    )
        .into_response()
}
