// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every error carries a stable machine-readable `code`; clients key off
//! the code, never the message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Stable error codes returned in the `code` field.
pub mod codes {
    pub const NO_AUTH_HEADER: &str = "NO_AUTH_HEADER";
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const VERIFICATION_FAILED: &str = "VERIFICATION_FAILED";

    pub const INVALID_NAME: &str = "INVALID_NAME";
    pub const NAME_TOO_LONG: &str = "NAME_TOO_LONG";
    pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
    pub const INVALID_FILENAME: &str = "INVALID_FILENAME";
    pub const INVALID_BODY: &str = "INVALID_BODY";
    pub const SELF_COLLABORATION: &str = "SELF_COLLABORATION";

    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const COLLABORATOR_NOT_FOUND: &str = "COLLABORATOR_NOT_FOUND";
    pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";

    pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
    pub const NOT_OWNER: &str = "NOT_OWNER";
    pub const ALREADY_COLLABORATOR: &str = "ALREADY_COLLABORATOR";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// What a `NotFound` error failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Repository,
    User,
    Collaborator,
    File,
    Route,
}

impl Missing {
    pub fn code(self) -> &'static str {
        match self {
            Missing::Repository | Missing::Route => codes::NOT_FOUND,
            Missing::User => codes::USER_NOT_FOUND,
            Missing::Collaborator => codes::COLLABORATOR_NOT_FOUND,
            Missing::File => codes::FILE_NOT_FOUND,
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required: {message}")]
    Unauthenticated {
        code: &'static str,
        message: String,
    },

    #[error("Forbidden: {message}")]
    Forbidden {
        code: &'static str,
        message: String,
    },

    #[error("Invalid request: {message}")]
    InvalidInput {
        code: &'static str,
        message: String,
    },

    #[error("Cannot add yourself as collaborator")]
    SelfCollaboration,

    #[error("Not found: {1}")]
    NotFound(Missing, String),

    #[error("Permission denied: {message}")]
    PermissionDenied {
        code: &'static str,
        message: String,
    },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            code,
            message: message.into(),
        }
    }

    pub fn denied(code: &'static str, message: impl Into<String>) -> Self {
        AppError::PermissionDenied {
            code,
            message: message.into(),
        }
    }

    pub fn repository_not_found() -> Self {
        AppError::NotFound(Missing::Repository, "Repository not found".to_string())
    }

    /// The stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::InvalidInput { code, .. }
            | AppError::PermissionDenied { code, .. } => code,
            AppError::SelfCollaboration => codes::SELF_COLLABORATION,
            AppError::NotFound(missing, _) => missing.code(),
            AppError::AlreadyExists(_) => codes::ALREADY_COLLABORATOR,
            AppError::RateLimited => codes::RATE_LIMITED,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                codes::INTERNAL_ERROR
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } | AppError::PermissionDenied { .. } => {
                StatusCode::FORBIDDEN
            }
            AppError::InvalidInput { .. } | AppError::SelfCollaboration => StatusCode::BAD_REQUEST,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid(codes::INVALID_BODY, rejection.body_text())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Unauthenticated { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::InvalidInput { message, .. }
            | AppError::PermissionDenied { message, .. } => message.clone(),
            AppError::NotFound(_, message) | AppError::AlreadyExists(message) => message.clone(),
            AppError::SelfCollaboration | AppError::RateLimited => self.to_string(),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "An error occurred".to_string()
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                "An error occurred".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "An error occurred".to_string()
            }
        };

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
