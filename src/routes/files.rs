// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Encrypted file routes.
//!
//! Two surfaces share the blob store:
//! - `/api/v1/files`: flat namespace behind the static shared token
//! - `/api/v1/repositories/{id}/files`: per-repository namespace behind the
//!   ID token; readers must be owner or collaborator, writers must be owner

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::{access, BlobScope};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

const OCTET_STREAM: &str = "application/octet-stream";

/// Legacy static-token routes. The static token middleware is applied in routes/mod.rs.
pub fn shared_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/files", get(list_shared))
        .route(
            "/api/v1/files/{name}",
            get(download_shared).post(upload_shared),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Repository-scoped routes. The auth middleware is applied in routes/mod.rs.
pub fn repository_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/repositories/{id}/files", get(list_repository_files))
        .route(
            "/api/v1/repositories/{id}/files/{name}",
            get(download_repository_file).put(upload_repository_file),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,
    pub files: Vec<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub size: usize,
}

fn blob_response(data: Vec<u8>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, OCTET_STREAM)], data)
}

fn uploaded(size: usize) -> (StatusCode, Json<UploadResponse>) {
    (
        StatusCode::CREATED,
        Json(UploadResponse {
            status: "uploaded",
            size,
        }),
    )
}

// ─── Shared namespace ────────────────────────────────────────

async fn list_shared(State(state): State<Arc<AppState>>) -> Result<Json<FileListResponse>> {
    let files = state.blobs.list(BlobScope::Shared).await?;
    Ok(Json(FileListResponse {
        repository_id: None,
        files,
    }))
}

async fn download_shared(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let data = state.blobs.get(BlobScope::Shared, &name).await?;
    Ok(blob_response(data))
}

async fn upload_shared(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    state.blobs.put(BlobScope::Shared, &name, &body).await?;
    tracing::info!(name = %name, size = body.len(), "Saved shared file");
    Ok(uploaded(body.len()))
}

// ─── Repository namespace ────────────────────────────────────

async fn list_repository_files(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<FileListResponse>> {
    let view = state
        .repositories
        .get(&id, &user.uid, user.email())
        .await?;

    let files = state
        .blobs
        .list(BlobScope::Repository(&view.repository.id))
        .await?;

    Ok(Json(FileListResponse {
        repository_id: Some(view.repository.id),
        files,
    }))
}

async fn download_repository_file(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let view = state
        .repositories
        .get(&id, &user.uid, user.email())
        .await?;

    let data = state
        .blobs
        .get(BlobScope::Repository(&view.repository.id), &name)
        .await?;
    Ok(blob_response(data))
}

async fn upload_repository_file(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let view = state
        .repositories
        .get(&id, &user.uid, user.email())
        .await?;
    access::require_owner(&view.repository, &user.uid, "upload files")?;

    state
        .blobs
        .put(BlobScope::Repository(&view.repository.id), &name, &body)
        .await?;

    tracing::info!(repo_id = %id, name = %name, size = body.len(), "Saved repository file");
    Ok(uploaded(body.len()))
}
