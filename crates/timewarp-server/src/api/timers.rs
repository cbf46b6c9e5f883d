use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

use super::{
    MessageResponse, TimerListResponse, TimerSummary, bad_request, lock_poisoned, parse_rfc3339,
    registry_error, timer_detail,
};
use crate::state::SharedState;
use crate::timer::{ReplyTemplate, Timer, TimerKind};
use timewarp::unix_time::Instant;

pub(super) fn router() -> Router<SharedState> {
    Router::new().route("/", get(list_timers)).route(
        "/{selector}",
        axum::routing::put(create_timer)
            .get(get_timer)
            .post(set_timer)
            .delete(delete_timer),
    )
}

/// Get all registered timers.
async fn list_timers(State(state): State<SharedState>) -> Response {
    let Ok(state) = state.read() else {
        return lock_poisoned();
    };
    let timers: Vec<TimerSummary> = state
        .timers()
        .map(|(id, timer)| TimerSummary {
            id,
            kind: timer.kind().to_string(),
        })
        .collect();
    (
        StatusCode::OK,
        Json(TimerListResponse {
            length: timers.len(),
            timers,
        }),
    )
        .into_response()
}

/// Create a new timer of the kind named by the path segment. Frozen and
/// advancing timers start at the current host time until set.
async fn create_timer(State(state): State<SharedState>, Path(selector): Path<String>) -> Response {
    let Ok(kind) = selector.parse::<TimerKind>() else {
        return bad_request("unknown timer kind");
    };
    let Ok(mut state) = state.write() else {
        return lock_poisoned();
    };
    let timer = Timer::of_kind(kind, ReplyTemplate::default(), Instant::now());
    let id = state.add_timer(timer);
    // The freshly inserted id always resolves.
    match state.timer(id) {
        Some(timer) => {
            (StatusCode::CREATED, Json(timer_detail(id, timer))).into_response()
        }
        None => lock_poisoned(),
    }
}

/// Get a specific timer.
async fn get_timer(State(state): State<SharedState>, Path(selector): Path<String>) -> Response {
    let Ok(id) = selector.parse::<u32>() else {
        return bad_request("invalid query id");
    };
    let Ok(state) = state.read() else {
        return lock_poisoned();
    };
    match state.timer(id) {
        Some(timer) => (StatusCode::OK, Json(timer_detail(id, timer))).into_response(),
        None => registry_error(crate::error::RegistryError::NotFound { id }),
    }
}

#[derive(Debug, Deserialize)]
struct SetTimerRequest {
    time: String,
}

/// Set the instant of a frozen or advancing timer from an RFC 3339 value.
async fn set_timer(
    State(state): State<SharedState>,
    Path(selector): Path<String>,
    Json(request): Json<SetTimerRequest>,
) -> Response {
    let Ok(id) = selector.parse::<u32>() else {
        return bad_request("invalid query id");
    };
    let Some(at) = parse_rfc3339(&request.time) else {
        return bad_request("can not parse time");
    };
    let Ok(mut state) = state.write() else {
        return lock_poisoned();
    };
    match state.set_timer(id, at) {
        Ok(()) => match state.timer(id) {
            Some(timer) => (StatusCode::OK, Json(timer_detail(id, timer))).into_response(),
            None => lock_poisoned(),
        },
        Err(err) => registry_error(err),
    }
}

/// Delete a timer. Refused while any route still references it.
async fn delete_timer(State(state): State<SharedState>, Path(selector): Path<String>) -> Response {
    let Ok(id) = selector.parse::<u32>() else {
        return bad_request("invalid query id");
    };
    let Ok(mut state) = state.write() else {
        return lock_poisoned();
    };
    match state.delete_timer(id) {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: String::from("delete timer success"),
            }),
        )
            .into_response(),
        Err(err) => registry_error(err),
    }
}
