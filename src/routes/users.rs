//! Caller profile routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::services::ProfileInput;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/users/me", get(get_me).post(sync_me))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    Ok(Json(state.users.get_profile(&user.uid).await?))
}

/// Create the profile on first sign-in, or record the login.
///
/// An empty body is accepted and treated as no profile fields.
async fn sync_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<User>> {
    let input = match body {
        Ok(Json(input)) => input,
        Err(JsonRejection::MissingJsonContentType(_)) => ProfileInput::default(),
        Err(rejection) => return Err(rejection.into()),
    };

    let profile = state
        .users
        .sync_profile(&user.uid, user.email(), input)
        .await?;
    Ok(Json(profile))
}
