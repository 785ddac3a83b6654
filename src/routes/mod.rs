// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod collaborators;
pub mod files;
pub mod repositories;
pub mod users;

use crate::error::{AppError, Missing};
use crate::middleware::{limit_api, record_server_errors, require_auth, require_static_token};
use crate::AppState;
use axum::http::{header, Method, Uri};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// JSON 404 for unknown endpoints.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(Missing::Route, format!("Endpoint {} not found", uri.path()))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let max_upload_bytes = state.config.max_upload_bytes;

    // Static shared token (legacy file service and operations)
    let static_token_routes = Router::new()
        .merge(files::shared_routes(max_upload_bytes))
        .merge(admin::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_static_token,
        ));

    // Firebase ID token
    let identity_routes = Router::new()
        .merge(repositories::routes())
        .merge(collaborators::routes())
        .merge(files::repository_routes(max_upload_bytes))
        .merge(users::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .merge(static_token_routes)
        .merge(identity_routes)
        .merge(admin::verify_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_api));

    Router::new()
        .merge(api)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            record_server_errors,
        ))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
