//! Request log bookkeeping shared by the middleware.

use crate::middleware::client_ip;
use crate::services::RequestLogEntry;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Append one outcome to the request log.
pub fn log_outcome(state: &AppState, request: &Request, status: &str, code: StatusCode) {
    state.request_log.record(RequestLogEntry {
        timestamp: now_rfc3339(),
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        status: status.to_string(),
        code: code.as_u16(),
        ip: client_ip(request),
    });
}

/// Append an `ERROR` entry for every 5xx response.
pub async fn record_server_errors(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let ip = client_ip(&request);

    let response = next.run(request).await;

    if response.status().is_server_error() {
        state.request_log.record(RequestLogEntry {
            timestamp: now_rfc3339(),
            method,
            path,
            status: "ERROR".to_string(),
            code: response.status().as_u16(),
            ip,
        });
    }

    response
}
