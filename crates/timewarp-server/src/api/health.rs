use std::collections::BTreeMap;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
struct HealthcheckResponse {
    status: bool,
    errors: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct PingResponse {
    status: &'static str,
}

pub(super) fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(healthcheck))
        .route("/ping", get(ping))
}

/// Verify the dependencies of the control plane and report per-check
/// errors. Currently the only dependency is the shared state lock.
async fn healthcheck(State(state): State<SharedState>) -> Response {
    let mut errors = BTreeMap::new();
    if state.read().is_err() {
        errors.insert(
            String::from("state"),
            String::from("state lock poisoned"),
        );
    }
    let status = errors.is_empty();
    let code = if status {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (code, Json(HealthcheckResponse { status, errors })).into_response()
}

/// A canary that only proves the API is serving requests.
async fn ping() -> Response {
    (StatusCode::OK, Json(PingResponse { status: "running" })).into_response()
}
