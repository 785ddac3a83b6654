// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collaborator membership routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/repositories/{id}/collaborators",
            get(list_collaborators).post(add_collaborator),
        )
        .route(
            "/api/v1/repositories/{id}/collaborators/{email}",
            delete(remove_collaborator),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CollaboratorListResponse {
    pub repository_id: String,
    pub collaborators: Vec<String>,
    pub total: usize,
}

async fn list_collaborators(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CollaboratorListResponse>> {
    let collaborators = state
        .membership
        .list_collaborators(&id, &user.uid, user.email())
        .await?;

    Ok(Json(CollaboratorListResponse {
        repository_id: id,
        total: collaborators.len(),
        collaborators,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CollaboratorChangeResponse {
    pub repository_id: String,
    pub collaborator: String,
    pub message: String,
}

async fn add_collaborator(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: std::result::Result<Json<AddCollaboratorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CollaboratorChangeResponse>)> {
    let Json(body) = body?;

    let repository_id = state
        .membership
        .add_collaborator(&id, &user.uid, user.email(), &body.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CollaboratorChangeResponse {
            repository_id,
            collaborator: body.email,
            message: "Collaborator added successfully".to_string(),
        }),
    ))
}

async fn remove_collaborator(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, email)): Path<(String, String)>,
) -> Result<Json<CollaboratorChangeResponse>> {
    let repository_id = state
        .membership
        .remove_collaborator(&id, &user.uid, &email)
        .await?;

    Ok(Json(CollaboratorChangeResponse {
        repository_id,
        collaborator: email,
        message: "Collaborator removed successfully".to_string(),
    }))
}
