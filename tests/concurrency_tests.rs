// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrent writers against one document.
//!
//! [`LockstepStore`] holds the next two reads at a barrier, so both
//! requests see the same snapshot before either one commits.

use async_trait::async_trait;
use githide::db::{DocumentStore, MembershipChange, MembershipOutcome, MemoryStore};
use githide::error::{codes, AppError};
use githide::models::{Repository, RepositoryPatch, User};
use githide::services::{MembershipService, ProfileInput, RepositoryService, UserService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

const CREATED_AT: &str = "2026-01-01T00:00:00.000Z";

struct LockstepStore {
    inner: MemoryStore,
    held: AtomicUsize,
    barrier: Barrier,
}

impl LockstepStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            held: AtomicUsize::new(0),
            barrier: Barrier::new(2),
        }
    }

    /// Hold the next two `get_user`/`get_repository` calls until both arrive.
    fn arm(&self) {
        self.held.store(2, Ordering::SeqCst);
    }

    async fn gate(&self) {
        let held = self
            .held
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if held.is_ok() {
            self.barrier.wait().await;
        }
    }
}

#[async_trait]
impl DocumentStore for LockstepStore {
    async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        let user = self.inner.get_user(uid).await;
        self.gate().await;
        user
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.inner.find_user_by_email(email).await
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        self.inner.create_user(user).await
    }

    async fn record_login(&self, uid: &str, at: &str) -> Result<(), AppError> {
        self.inner.record_login(uid, at).await
    }

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>, AppError> {
        let repo = self.inner.get_repository(repo_id).await;
        self.gate().await;
        repo
    }

    async fn repositories_owned_by(&self, uid: &str) -> Result<Vec<Repository>, AppError> {
        self.inner.repositories_owned_by(uid).await
    }

    async fn repositories_shared_with(&self, email: &str) -> Result<Vec<Repository>, AppError> {
        self.inner.repositories_shared_with(email).await
    }

    async fn create_repository(&self, repository: &Repository) -> Result<bool, AppError> {
        self.inner.create_repository(repository).await
    }

    async fn update_repository(
        &self,
        repo_id: &str,
        patch: &RepositoryPatch,
        updated_at: &str,
    ) -> Result<(), AppError> {
        self.inner.update_repository(repo_id, patch, updated_at).await
    }

    async fn delete_repository(&self, repo_id: &str) -> Result<(), AppError> {
        self.inner.delete_repository(repo_id).await
    }

    async fn apply_membership(
        &self,
        change: &MembershipChange,
    ) -> Result<MembershipOutcome, AppError> {
        self.inner.apply_membership(change).await
    }
}

async fn repository_with_users(users: &[(&str, &str)]) -> (Arc<LockstepStore>, String) {
    let store = Arc::new(LockstepStore::new());
    store
        .inner
        .put_user(User::new("owner", "owner@example.com", "", "", CREATED_AT))
        .await;
    for (uid, email) in users {
        store
            .inner
            .put_user(User::new(*uid, *email, "", "", CREATED_AT))
            .await;
    }
    let repo = RepositoryService::new(store.clone())
        .create("owner", "infra", None)
        .await
        .unwrap();
    (store, repo.id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_adds_to_one_repository_both_land() {
    let (store, repo_id) =
        repository_with_users(&[("a", "a@example.com"), ("b", "b@example.com")]).await;
    let membership = MembershipService::new(store.clone());

    store.arm();
    let (a, b) = tokio::join!(
        membership.add_collaborator(&repo_id, "owner", None, "a@example.com"),
        membership.add_collaborator(&repo_id, "owner", None, "b@example.com"),
    );
    a.unwrap();
    b.unwrap();

    let mut collaborators = store
        .inner
        .get_repository(&repo_id)
        .await
        .unwrap()
        .unwrap()
        .collaborators;
    collaborators.sort();
    assert_eq!(collaborators, vec!["a@example.com", "b@example.com"]);

    for uid in ["a", "b"] {
        let user = store.inner.get_user(uid).await.unwrap().unwrap();
        assert_eq!(user.repositories_shared, 1, "{uid}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_adds_of_one_email_count_once() {
    let (store, repo_id) = repository_with_users(&[("a", "a@example.com")]).await;
    let membership = MembershipService::new(store.clone());

    store.arm();
    let (first, second) = tokio::join!(
        membership.add_collaborator(&repo_id, "owner", None, "a@example.com"),
        membership.add_collaborator(&repo_id, "owner", None, "a@example.com"),
    );

    let errors: Vec<AppError> = [first, second].into_iter().filter_map(Result::err).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), codes::ALREADY_COLLABORATOR);

    let repo = store.inner.get_repository(&repo_id).await.unwrap().unwrap();
    assert_eq!(repo.collaborators, vec!["a@example.com"]);
    let user = store.inner.get_user("a").await.unwrap().unwrap();
    assert_eq!(user.repositories_shared, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_add_and_remove_keep_counters_in_step() {
    let (store, repo_id) =
        repository_with_users(&[("a", "a@example.com"), ("b", "b@example.com")]).await;
    let membership = MembershipService::new(store.clone());
    membership
        .add_collaborator(&repo_id, "owner", None, "a@example.com")
        .await
        .unwrap();

    store.arm();
    let (added, removed) = tokio::join!(
        membership.add_collaborator(&repo_id, "owner", None, "b@example.com"),
        membership.remove_collaborator(&repo_id, "owner", "a@example.com"),
    );
    added.unwrap();
    removed.unwrap();

    let repo = store.inner.get_repository(&repo_id).await.unwrap().unwrap();
    assert_eq!(repo.collaborators, vec!["b@example.com"]);
    let a = store.inner.get_user("a").await.unwrap().unwrap();
    let b = store.inner.get_user("b").await.unwrap().unwrap();
    assert_eq!(a.repositories_shared, 0);
    assert_eq!(b.repositories_shared, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_first_sign_ins_create_one_profile() {
    let store = Arc::new(LockstepStore::new());
    let users = UserService::new(store.clone());

    store.arm();
    let (first, second) = tokio::join!(
        users.sync_profile("new", Some("new@example.com"), ProfileInput::default()),
        users.sync_profile("new", Some("new@example.com"), ProfileInput::default()),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    let stored = store.inner.get_user("new").await.unwrap().unwrap();
    assert_eq!(first.created_at, stored.created_at);
    assert_eq!(second.created_at, stored.created_at);
}

#[tokio::test]
async fn test_create_user_keeps_existing_document() {
    let store = MemoryStore::new();
    let mut existing = User::new("u1", "u1@example.com", "Old", "", CREATED_AT);
    existing.repositories_owned = 2;
    existing.repositories_shared = 3;
    store.put_user(existing.clone()).await;

    let fresh = User::new("u1", "u1@example.com", "New", "", "2026-02-01T00:00:00.000Z");
    assert!(!store.create_user(&fresh).await.unwrap());

    let stored = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(stored, existing);
}
