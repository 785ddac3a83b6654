// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repository create/read/update/delete.

use crate::db::DocumentStore;
use crate::error::{codes, AppError, Result};
use crate::models::{Repository, RepositoryPatch, RepositoryView, Role};
use crate::services::access;
use crate::time_utils::now_rfc3339;
use futures_util::future::try_join;
use std::collections::HashSet;
use std::sync::Arc;

/// Maximum repository name length, in characters, after trimming.
pub const MAX_NAME_CHARS: usize = 100;

/// Trim a repository name and require it to be non-empty.
fn required_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid(
            codes::INVALID_NAME,
            "Repository name is required",
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim and check the name of a new repository.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = required_name(name)?;
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::invalid(
            codes::NAME_TOO_LONG,
            format!("Repository name must be at most {MAX_NAME_CHARS} characters"),
        ));
    }
    Ok(trimmed)
}

/// Repository operations, authorized through [`access`].
#[derive(Clone)]
pub struct RepositoryService {
    store: Arc<dyn DocumentStore>,
}

impl RepositoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a repository owned by `owner_uid`. Returns the stored document.
    pub async fn create(
        &self,
        owner_uid: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Repository> {
        let name = validate_name(name)?;
        let now = chrono::Utc::now();
        let timestamp = crate::time_utils::format_utc_rfc3339(now);

        let mut repository = Repository {
            id: String::new(),
            name,
            description: description.map(str::trim).unwrap_or_default().to_string(),
            owner_id: owner_uid.to_string(),
            collaborators: Vec::new(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        // Ids are `{uid}_{millis}`; two creates in the same millisecond take the next free one.
        let mut millis = now.timestamp_millis();
        loop {
            repository.id = format!("{owner_uid}_{millis}");
            if self.store.create_repository(&repository).await? {
                break;
            }
            millis += 1;
        }

        tracing::info!(repo_id = %repository.id, owner = owner_uid, "Repository created");
        Ok(repository)
    }

    /// Fetch a repository the caller can read, with the caller's role.
    pub async fn get(
        &self,
        repo_id: &str,
        caller_uid: &str,
        caller_email: Option<&str>,
    ) -> Result<RepositoryView> {
        let repository = self.load(repo_id).await?;
        let user_role = access::require_read(&repository, caller_uid, caller_email)?;
        Ok(RepositoryView {
            repository,
            user_role,
        })
    }

    /// Every repository the caller owns or collaborates on, each listed once.
    /// Order is unspecified.
    pub async fn list_for_user(
        &self,
        uid: &str,
        email: Option<&str>,
    ) -> Result<Vec<RepositoryView>> {
        let shared = async {
            match email {
                Some(email) => self.store.repositories_shared_with(email).await,
                None => Ok(Vec::new()),
            }
        };
        let (owned, shared) = try_join(self.store.repositories_owned_by(uid), shared).await?;

        let mut seen = HashSet::new();
        let tagged = owned
            .into_iter()
            .map(|r| (r, Role::Owner))
            .chain(shared.into_iter().map(|r| (r, Role::Collaborator)));

        let mut views = Vec::new();
        for (repository, user_role) in tagged {
            if seen.insert(repository.id.clone()) {
                views.push(RepositoryView {
                    repository,
                    user_role,
                });
            }
        }

        Ok(views)
    }

    /// Owner-only partial update. Returns the repository as stored afterwards.
    /// A new name must be non-empty; the create-time length limit does not apply.
    pub async fn update(
        &self,
        repo_id: &str,
        caller_uid: &str,
        patch: RepositoryPatch,
    ) -> Result<Repository> {
        let mut repository = self.load(repo_id).await?;
        access::require_owner(&repository, caller_uid, "update it")?;

        let patch = RepositoryPatch {
            name: patch.name.as_deref().map(required_name).transpose()?,
            description: patch.description.map(|d| d.trim().to_string()),
        };
        let updated_at = now_rfc3339();

        self.store
            .update_repository(repo_id, &patch, &updated_at)
            .await?;

        if let Some(name) = patch.name {
            repository.name = name;
        }
        if let Some(description) = patch.description {
            repository.description = description;
        }
        repository.updated_at = updated_at;

        tracing::info!(repo_id, owner = caller_uid, "Repository updated");
        Ok(repository)
    }

    /// Owner-only delete. Collaborators' `repositoriesShared` counters are
    /// left as they are.
    pub async fn delete(&self, repo_id: &str, caller_uid: &str) -> Result<String> {
        let repository = self.load(repo_id).await?;
        access::require_owner(&repository, caller_uid, "delete it")?;

        self.store.delete_repository(repo_id).await?;

        tracing::info!(
            repo_id,
            owner = caller_uid,
            collaborators = repository.collaborators.len(),
            "Repository deleted"
        );
        Ok(repo_id.to_string())
    }

    async fn load(&self, repo_id: &str) -> Result<Repository> {
        self.store
            .get_repository(repo_id)
            .await?
            .ok_or_else(AppError::repository_not_found)
    }
}
