// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Operational routes guarded by the static shared token.

use crate::error::{AppError, Result};
use crate::middleware::client_ip;
use crate::middleware::request_log::log_outcome;
use crate::middleware::static_token::{check_static_token, StaticTokenCheck};
use crate::services::RequestLogEntry;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Seconds a verified static token is advertised as valid for.
const VERIFY_EXPIRES_IN_SECS: u64 = 3600;

/// Routes behind `require_static_token` (applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/admin/logs", get(get_logs))
}

/// `/auth/verify` does its own token check so it can count failures.
pub fn verify_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/auth/verify", post(verify_token))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub storage: String,
    pub build_id: String,
}

/// Health check response
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: now_rfc3339(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        storage: state.blobs.root().display().to_string(),
        build_id,
    })
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub logs: Vec<RequestLogEntry>,
    pub total: usize,
    pub timestamp: String,
}

async fn get_logs(State(state): State<Arc<AppState>>) -> Json<LogsResponse> {
    let logs = state.request_log.snapshot();
    Json(LogsResponse {
        total: logs.len(),
        logs,
        timestamp: now_rfc3339(),
    })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    pub message: String,
}

/// Check a static token. Only failed attempts count against the limiter.
async fn verify_token(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response> {
    let client = client_ip(&request);
    if state.verify_limiter.is_exhausted(&client) {
        tracing::warn!(client = %client, "Too many failed token verifications");
        return Err(AppError::RateLimited);
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let (status, outcome, message) =
        match check_static_token(header_value, &state.config.static_auth_token) {
            StaticTokenCheck::Valid => (StatusCode::OK, "AUTH_VERIFY_SUCCESS", "Token is valid"),
            StaticTokenCheck::Missing => (
                StatusCode::UNAUTHORIZED,
                "AUTH_VERIFY_FAILED",
                "Missing authorization header",
            ),
            StaticTokenCheck::Empty | StaticTokenCheck::Mismatch => {
                (StatusCode::FORBIDDEN, "AUTH_VERIFY_INVALID", "Invalid token")
            }
        };

    log_outcome(&state, &request, outcome, status);

    let authenticated = status == StatusCode::OK;
    if !authenticated {
        state.verify_limiter.record(&client);
    }

    let body = VerifyResponse {
        authenticated,
        expires_in: authenticated.then_some(VERIFY_EXPIRES_IN_SECS),
        message: message.to_string(),
    };
    Ok((status, Json(body)).into_response())
}
