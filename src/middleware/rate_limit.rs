//! Per-client rate limiting for `/api/v1`.

use crate::error::AppError;
use crate::middleware::client_ip;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Reject clients that exceeded the general API budget with 429.
pub async fn limit_api(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_ip(&request);
    if !state.api_limiter.try_acquire(&client) {
        tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}
