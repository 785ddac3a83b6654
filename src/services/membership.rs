// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collaborator membership management.
//!
//! A repository's `collaborators` list is the source of truth; each user's
//! `repositoriesShared` is a cached count kept in step with it. Both move
//! together through one [`MembershipChange`], which the store applies to
//! the documents as they are at commit time.

use crate::db::{DocumentStore, MembershipChange, MembershipOp, MembershipOutcome};
use crate::error::{codes, AppError, Missing, Result};
use crate::services::access;
use crate::time_utils::now_rfc3339;
use std::sync::Arc;

/// Add/remove collaborators on repositories.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn DocumentStore>,
}

impl MembershipService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Collaborator emails of a repository the caller can read.
    pub async fn list_collaborators(
        &self,
        repo_id: &str,
        caller_uid: &str,
        caller_email: Option<&str>,
    ) -> Result<Vec<String>> {
        let repo = self
            .store
            .get_repository(repo_id)
            .await?
            .ok_or_else(AppError::repository_not_found)?;

        access::require_read(&repo, caller_uid, caller_email)?;
        Ok(repo.collaborators)
    }

    /// Add `email` as a collaborator. Checks run in a fixed order and the
    /// first failure wins; nothing is written unless all pass.
    pub async fn add_collaborator(
        &self,
        repo_id: &str,
        caller_uid: &str,
        caller_email: Option<&str>,
        email: &str,
    ) -> Result<String> {
        if !email.contains('@') {
            return Err(AppError::invalid(
                codes::INVALID_EMAIL,
                "Valid email is required",
            ));
        }

        if caller_email == Some(email) {
            return Err(AppError::SelfCollaboration);
        }

        let repo = self
            .store
            .get_repository(repo_id)
            .await?
            .ok_or_else(AppError::repository_not_found)?;

        access::require_owner(&repo, caller_uid, "add collaborators")?;

        if repo.has_collaborator(email) {
            return Err(AppError::AlreadyExists(
                "User is already a collaborator".to_string(),
            ));
        }

        let collaborator = self.store.find_user_by_email(email).await?.ok_or_else(|| {
            AppError::NotFound(
                Missing::User,
                "User with this email does not exist".to_string(),
            )
        })?;

        // Callers whose token carries no email are caught here instead.
        if collaborator.uid == repo.owner_id {
            return Err(AppError::SelfCollaboration);
        }

        let change = MembershipChange {
            repo_id: repo_id.to_string(),
            email: email.to_string(),
            op: MembershipOp::Add,
            collaborator_uid: Some(collaborator.uid),
            updated_at: now_rfc3339(),
        };
        match self.store.apply_membership(&change).await? {
            MembershipOutcome::Applied => {}
            // A concurrent request added the same email first.
            MembershipOutcome::Unchanged => {
                return Err(AppError::AlreadyExists(
                    "User is already a collaborator".to_string(),
                ))
            }
            MembershipOutcome::RepositoryMissing => return Err(AppError::repository_not_found()),
        }

        tracing::info!(
            repo_id,
            owner = caller_uid,
            collaborator = email,
            "Collaborator added"
        );

        Ok(repo_id.to_string())
    }

    /// Remove `email` from the collaborators. The counter decrement is
    /// best-effort: a collaborator without a user document is still removed.
    pub async fn remove_collaborator(
        &self,
        repo_id: &str,
        caller_uid: &str,
        email: &str,
    ) -> Result<String> {
        let repo = self
            .store
            .get_repository(repo_id)
            .await?
            .ok_or_else(AppError::repository_not_found)?;

        access::require_owner(&repo, caller_uid, "remove collaborators")?;

        if !repo.has_collaborator(email) {
            return Err(collaborator_not_found());
        }

        let collaborator_uid = match self.store.find_user_by_email(email).await? {
            Some(user) => Some(user.uid),
            None => {
                tracing::warn!(
                    repo_id,
                    collaborator = email,
                    "Removed collaborator has no user document; counter left alone"
                );
                None
            }
        };

        let change = MembershipChange {
            repo_id: repo_id.to_string(),
            email: email.to_string(),
            op: MembershipOp::Remove,
            collaborator_uid,
            updated_at: now_rfc3339(),
        };
        match self.store.apply_membership(&change).await? {
            MembershipOutcome::Applied => {}
            MembershipOutcome::Unchanged => return Err(collaborator_not_found()),
            MembershipOutcome::RepositoryMissing => return Err(AppError::repository_not_found()),
        }

        tracing::info!(
            repo_id,
            owner = caller_uid,
            collaborator = email,
            "Collaborator removed"
        );

        Ok(repo_id.to_string())
    }
}

fn collaborator_not_found() -> AppError {
    AppError::NotFound(
        Missing::Collaborator,
        "Collaborator not found in this repository".to_string(),
    )
}
