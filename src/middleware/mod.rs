// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security, etc.).

pub mod auth;
pub mod rate_limit;
pub mod request_log;
pub mod security;
pub mod static_token;

pub use auth::{require_auth, AuthUser};
pub use rate_limit::limit_api;
pub use request_log::record_server_errors;
pub use static_token::require_static_token;

use axum::extract::{ConnectInfo, Request};
use std::net::SocketAddr;

/// Best-effort client address: peer IP, then the first `X-Forwarded-For` hop.
pub fn client_ip(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}
