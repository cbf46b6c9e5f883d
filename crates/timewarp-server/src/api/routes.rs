use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

use super::{
    MessageResponse, RouteListResponse, bad_request, lock_poisoned, route_detail, routing_error,
};
use crate::routing::IpNet;
use crate::state::SharedState;

pub(super) fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_routes).put(create_route))
        .route(
            "/default",
            get(list_default_routes).post(retarget_default_routes),
        )
        .route(
            "/{id}",
            get(get_route).post(retarget_route).delete(delete_route),
        )
}

/// Get all registered routes.
async fn list_routes(State(state): State<SharedState>) -> Response {
    let Ok(state) = state.read() else {
        return lock_poisoned();
    };
    let routes: Vec<_> = state
        .routes()
        .iter()
        .map(|entry| route_detail(&state, entry))
        .collect();
    (
        StatusCode::OK,
        Json(RouteListResponse {
            length: routes.len(),
            routes,
        }),
    )
        .into_response()
}

/// Get the subset of routes covering loopback, link-local, and unspecified
/// networks. These routes can be retargeted but never deleted.
async fn list_default_routes(State(state): State<SharedState>) -> Response {
    let Ok(state) = state.read() else {
        return lock_poisoned();
    };
    let routes: Vec<_> = state
        .routes()
        .iter()
        .filter(|entry| entry.net.is_default_cover())
        .map(|entry| route_detail(&state, entry))
        .collect();
    (
        StatusCode::OK,
        Json(RouteListResponse {
            length: routes.len(),
            routes,
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewRouteRequest {
    subnet: String,
    timer_id: u32,
}

/// Create a new route binding a subnet to a timer.
async fn create_route(
    State(state): State<SharedState>,
    Json(request): Json<NewRouteRequest>,
) -> Response {
    let Ok(net) = request.subnet.parse::<IpNet>() else {
        return bad_request("can not parse subnet");
    };
    let Ok(mut state) = state.write() else {
        return lock_poisoned();
    };
    match state.add_route(net, request.timer_id) {
        Ok(id) => match state.route(id) {
            Some(entry) => {
                (StatusCode::CREATED, Json(route_detail(&state, entry))).into_response()
            }
            None => lock_poisoned(),
        },
        Err(err) => routing_error(err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetargetRouteRequest {
    timer_id: u32,
}

/// Retarget every default route to another timer.
async fn retarget_default_routes(
    State(state): State<SharedState>,
    Json(request): Json<RetargetRouteRequest>,
) -> Response {
    let Ok(mut state) = state.write() else {
        return lock_poisoned();
    };
    match state.retarget_default_routes(request.timer_id) {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: String::from("default route update success"),
            }),
        )
            .into_response(),
        Err(err) => routing_error(err),
    }
}

/// Get a specific route.
async fn get_route(State(state): State<SharedState>, Path(selector): Path<String>) -> Response {
    let Ok(id) = selector.parse::<u32>() else {
        return bad_request("invalid query id");
    };
    let Ok(state) = state.read() else {
        return lock_poisoned();
    };
    match state.route(id) {
        Some(entry) => (StatusCode::OK, Json(route_detail(&state, entry))).into_response(),
        None => routing_error(crate::error::RoutingError::NotFound { id }),
    }
}

/// Retarget a specific route to another timer.
async fn retarget_route(
    State(state): State<SharedState>,
    Path(selector): Path<String>,
    Json(request): Json<RetargetRouteRequest>,
) -> Response {
    let Ok(id) = selector.parse::<u32>() else {
        return bad_request("invalid query id");
    };
    let Ok(mut state) = state.write() else {
        return lock_poisoned();
    };
    match state.retarget_route(id, request.timer_id) {
        Ok(()) => match state.route(id) {
            Some(entry) => (StatusCode::OK, Json(route_detail(&state, entry))).into_response(),
            None => lock_poisoned(),
        },
        Err(err) => routing_error(err),
    }
}

/// Delete a route. Default routes are protected.
async fn delete_route(State(state): State<SharedState>, Path(selector): Path<String>) -> Response {
    let Ok(id) = selector.parse::<u32>() else {
        return bad_request("invalid query id");
    };
    let Ok(mut state) = state.write() else {
        return lock_poisoned();
    };
    match state.remove_route(id) {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: String::from("delete route success"),
            }),
        )
            .into_response(),
        Err(err) => routing_error(err),
    }
}
