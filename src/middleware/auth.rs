// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::error::{codes, AppError};
use crate::services::TokenError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie the frontend sets with the current ID token.
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated user extracted from the ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Firebase uid
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

impl AuthUser {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Pull the raw token from `Authorization: Bearer`, falling back to the session cookie.
fn extract_token(request: &Request, jar: &CookieJar) -> Result<String, AppError> {
    if let Some(value) = request.headers().get(header::AUTHORIZATION) {
        let value = value.to_str().unwrap_or("");
        let Some(token) = value.strip_prefix("Bearer ") else {
            return Err(AppError::Unauthenticated {
                code: codes::INVALID_FORMAT,
                message: "Authorization header must be 'Bearer <token>'".to_string(),
            });
        };
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Unauthenticated {
                code: codes::INVALID_FORMAT,
                message: "Bearer token is empty".to_string(),
            });
        }
        return Ok(token.to_string());
    }

    match jar.get(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => Ok(cookie.value().to_string()),
        _ => Err(AppError::Unauthenticated {
            code: codes::NO_AUTH_HEADER,
            message: "No authorization token provided".to_string(),
        }),
    }
}

/// Middleware that requires a valid Firebase ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request, &jar)?;

    let identity = state
        .identity
        .verify_id_token(&token)
        .await
        .map_err(|err| match err {
            TokenError::Expired => AppError::Unauthenticated {
                code: codes::TOKEN_EXPIRED,
                message: "Token has expired".to_string(),
            },
            TokenError::Invalid(reason) => {
                tracing::warn!(reason = %reason, "Rejected ID token");
                AppError::Forbidden {
                    code: codes::INVALID_TOKEN,
                    message: "Invalid token".to_string(),
                }
            }
            TokenError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "ID token verification unavailable");
                AppError::Forbidden {
                    code: codes::VERIFICATION_FAILED,
                    message: "Token verification failed".to_string(),
                }
            }
        })?;

    request.extensions_mut().insert(AuthUser {
        uid: identity.uid,
        email: identity.email,
        email_verified: identity.email_verified,
    });

    Ok(next.run(request).await)
}
