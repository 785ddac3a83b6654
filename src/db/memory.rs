//! In-process document store.
//!
//! Used by the test suite and by `GITHIDE_STORE=memory` for local runs.
//! Both collections sit behind one lock so multi-document commits are atomic.

use crate::db::{Counter, DocumentStore, MembershipChange, MembershipOutcome};
use crate::error::AppError;
use crate::models::{Repository, RepositoryPatch, User};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    repositories: HashMap<String, Repository>,
}

/// Document store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `user`, replacing any document with the same uid.
    pub async fn put_user(&self, user: User) {
        self.inner.write().await.users.insert(user.uid.clone(), user);
    }

    /// Number of stored repositories.
    pub async fn repository_count(&self) -> usize {
        self.inner.read().await.repositories.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(uid).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.uid) {
            return Ok(false);
        }
        inner.users.insert(user.uid.clone(), user.clone());
        Ok(true)
    }

    async fn record_login(&self, uid: &str, at: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(uid)
            .ok_or_else(|| AppError::Database(format!("No user document for uid {uid}")))?;
        user.last_login_at = at.to_string();
        Ok(())
    }

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>, AppError> {
        Ok(self.inner.read().await.repositories.get(repo_id).cloned())
    }

    async fn repositories_owned_by(&self, uid: &str) -> Result<Vec<Repository>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .repositories
            .values()
            .filter(|r| r.owner_id == uid)
            .cloned()
            .collect())
    }

    async fn repositories_shared_with(&self, email: &str) -> Result<Vec<Repository>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .repositories
            .values()
            .filter(|r| r.has_collaborator(email))
            .cloned()
            .collect())
    }

    async fn create_repository(&self, repository: &Repository) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        if inner.repositories.contains_key(&repository.id) {
            return Ok(false);
        }
        if let Some(owner) = inner.users.get_mut(&repository.owner_id) {
            Counter::RepositoriesOwned.adjust(owner, 1);
        }
        inner
            .repositories
            .insert(repository.id.clone(), repository.clone());
        Ok(true)
    }

    async fn update_repository(
        &self,
        repo_id: &str,
        patch: &RepositoryPatch,
        updated_at: &str,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let repo = inner
            .repositories
            .get_mut(repo_id)
            .ok_or_else(|| AppError::Database(format!("No repository document {repo_id}")))?;

        if let Some(name) = &patch.name {
            repo.name = name.clone();
        }
        if let Some(description) = &patch.description {
            repo.description = description.clone();
        }
        repo.updated_at = updated_at.to_string();
        Ok(())
    }

    async fn delete_repository(&self, repo_id: &str) -> Result<(), AppError> {
        self.inner.write().await.repositories.remove(repo_id);
        Ok(())
    }

    async fn apply_membership(
        &self,
        change: &MembershipChange,
    ) -> Result<MembershipOutcome, AppError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let Some(repo) = inner.repositories.get_mut(&change.repo_id) else {
            return Ok(MembershipOutcome::RepositoryMissing);
        };
        if !change.apply_to(&mut repo.collaborators) {
            return Ok(MembershipOutcome::Unchanged);
        }
        repo.updated_at = change.updated_at.clone();

        if let Some(user) = change
            .collaborator_uid
            .as_deref()
            .and_then(|uid| inner.users.get_mut(uid))
        {
            Counter::RepositoriesShared.adjust(user, change.op.counter_delta());
        }
        Ok(MembershipOutcome::Applied)
    }
}
