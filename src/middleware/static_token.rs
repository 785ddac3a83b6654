// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static shared-secret authentication for the legacy file service.
//!
//! Every attempt is recorded in the request log with an outcome label.

use crate::error::{codes, AppError};
use crate::middleware::request_log::log_outcome;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Outcome of checking a static token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticTokenCheck {
    Missing,
    Empty,
    Mismatch,
    Valid,
}

impl StaticTokenCheck {
    pub fn label(self) -> &'static str {
        match self {
            StaticTokenCheck::Missing => "MISSING_AUTH",
            StaticTokenCheck::Empty => "EMPTY_TOKEN",
            StaticTokenCheck::Mismatch => "INVALID_TOKEN",
            StaticTokenCheck::Valid => "AUTH_SUCCESS",
        }
    }

    fn into_error(self) -> Option<AppError> {
        match self {
            StaticTokenCheck::Missing => Some(AppError::Unauthenticated {
                code: codes::NO_AUTH_HEADER,
                message: "No authorization header provided".to_string(),
            }),
            StaticTokenCheck::Empty => Some(AppError::Unauthenticated {
                code: codes::INVALID_FORMAT,
                message: "Bearer token is empty".to_string(),
            }),
            StaticTokenCheck::Mismatch => Some(AppError::Forbidden {
                code: codes::INVALID_TOKEN,
                message: "Invalid token".to_string(),
            }),
            StaticTokenCheck::Valid => None,
        }
    }
}

/// Compare an `Authorization` header value against the configured secret.
pub fn check_static_token(header_value: Option<&str>, expected: &str) -> StaticTokenCheck {
    let Some(value) = header_value else {
        return StaticTokenCheck::Missing;
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return StaticTokenCheck::Missing;
    };
    let token = token.trim();
    if token.is_empty() {
        return StaticTokenCheck::Empty;
    }
    if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        StaticTokenCheck::Valid
    } else {
        StaticTokenCheck::Mismatch
    }
}

/// Require `Authorization: Bearer <AUTH_TOKEN>`.
pub async fn require_static_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let check = check_static_token(header_value, &state.config.static_auth_token);

    if let Some(err) = check.into_error() {
        tracing::warn!(
            outcome = check.label(),
            path = %request.uri().path(),
            "Blocked file service request"
        );
        log_outcome(&state, &request, check.label(), err.status());
        return Err(err);
    }

    log_outcome(&state, &request, check.label(), StatusCode::OK);
    Ok(next.run(request).await)
}
