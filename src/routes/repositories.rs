// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repository CRUD routes (require a Firebase ID token).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Repository, RepositoryPatch, RepositoryView};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Repository routes. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/repositories",
            get(list_repositories).post(create_repository),
        )
        .route(
            "/api/v1/repositories/{id}",
            get(get_repository)
                .patch(update_repository)
                .delete(delete_repository),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RepositoryListResponse {
    pub repositories: Vec<RepositoryView>,
    pub total: usize,
    pub timestamp: String,
}

/// Repositories the caller owns or collaborates on.
async fn list_repositories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RepositoryListResponse>> {
    let repositories = state
        .repositories
        .list_for_user(&user.uid, user.email())
        .await?;

    Ok(Json(RepositoryListResponse {
        total: repositories.len(),
        repositories,
        timestamp: now_rfc3339(),
    }))
}

async fn get_repository(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<RepositoryView>> {
    let view = state
        .repositories
        .get(&id, &user.uid, user.email())
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct CreateRepositoryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

async fn create_repository(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<CreateRepositoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Repository>)> {
    let Json(body) = body?;

    let repository = state
        .repositories
        .create(&user.uid, &body.name, body.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(repository)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateRepositoryResponse {
    #[serde(flatten)]
    pub repository: Repository,
    pub message: String,
}

async fn update_repository(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: std::result::Result<Json<RepositoryPatch>, JsonRejection>,
) -> Result<Json<UpdateRepositoryResponse>> {
    let Json(patch) = body?;

    let repository = state.repositories.update(&id, &user.uid, patch).await?;

    Ok(Json(UpdateRepositoryResponse {
        repository,
        message: "Repository updated successfully".to_string(),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteRepositoryResponse {
    pub id: String,
    pub message: String,
}

/// Delete a repository and its stored files.
async fn delete_repository(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteRepositoryResponse>> {
    let id = state.repositories.delete(&id, &user.uid).await?;

    // The document is already gone; orphaned files are only wasted disk.
    if let Err(e) = state.blobs.purge_repository(&id).await {
        let err = AppError::from(e);
        tracing::error!(repo_id = %id, error = %err, "Failed to purge repository files");
    }

    Ok(Json(DeleteRepositoryResponse {
        id,
        message: "Repository deleted successfully".to_string(),
    }))
}
