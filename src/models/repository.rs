// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repository model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Repository document stored in Firestore (`repositories/{id}`).
///
/// The owner's email never appears in `collaborators`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Repository {
    /// Document ID (`{ownerUid}_{createdMillis}`). Firestore keeps it in the
    /// document name only; reads fill it from `_firestore_id`.
    #[serde(alias = "_firestore_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Owner's Firebase uid
    pub owner_id: String,
    /// Collaborator emails (order is not meaningful)
    #[serde(default)]
    pub collaborators: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Repository {
    pub fn has_collaborator(&self, email: &str) -> bool {
        self.collaborators.iter().any(|c| c == email)
    }
}

/// Partial update of a repository. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RepositoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A caller's relationship to a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    Owner,
    Collaborator,
    #[serde(rename = "none")]
    NoAccess,
}

/// Repository as seen by a specific caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RepositoryView {
    #[serde(flatten)]
    pub repository: Repository,
    pub user_role: Role,
}
