//! Request middleware: IP whitelist, shared-token auth, and the handler
//! deadline.

use crate::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;

/// Per-request handler deadline, matching the HTTP read/write timeouts.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Rejects requests whose token does not match the configured secret.
///
/// The token travels in the `Authorization` header, either bare or as
/// `Bearer <token>`.
pub async fn check_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.options.auth.as_str();
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let authorized = match provided {
        Some(value) => value == expected || value.strip_prefix("Bearer ") == Some(expected),
        None => false,
    };

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "unauthorized: invalid auth token." })),
        )
            .into_response();
    }

    next.run(request).await
}

/// Rejects clients whose address is not on the configured whitelist.
/// A missing or empty whitelist admits everyone.
pub async fn check_allow_ip(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(allowed) = state
        .options
        .allow_ip
        .as_ref()
        .filter(|list| !list.is_empty())
    {
        let client_ip = addr.ip().to_string();
        if !allowed.iter().any(|ip| *ip == client_ip) {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "ip address not allowed." })),
            )
                .into_response();
        }
    }

    next.run(request).await
}

/// Bounds handler time at [`REQUEST_TIMEOUT`].
pub async fn enforce_deadline(request: Request, next: Next) -> Response {
    match tokio::time::timeout(REQUEST_TIMEOUT, next.run(request)).await {
        Ok(response) => response,
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "request timed out." })),
        )
            .into_response(),
    }
}
