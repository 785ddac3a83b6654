// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collaborator membership bookkeeping.
//!
//! The collaborator list on a repository and `repositoriesShared` on the
//! collaborator's user document must move together.

use githide::db::{DocumentStore, MemoryStore};
use githide::error::{codes, AppError};
use githide::models::User;
use githide::services::{MembershipService, RepositoryService};
use std::sync::Arc;

const OWNER_UID: &str = "owner-uid";
const OWNER_EMAIL: &str = "owner@example.com";
const U2_UID: &str = "u2-uid";
const U2_EMAIL: &str = "u2@example.com";

struct Fixture {
    store: Arc<MemoryStore>,
    repositories: RepositoryService,
    membership: MembershipService,
    repo_id: String,
}

async fn setup() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    for (uid, email) in [(OWNER_UID, OWNER_EMAIL), (U2_UID, U2_EMAIL)] {
        store
            .put_user(User::new(uid, email, "", "", "2026-01-01T00:00:00.000Z"))
            .await;
    }

    let repositories = RepositoryService::new(store.clone());
    let membership = MembershipService::new(store.clone());
    let repo = repositories
        .create(OWNER_UID, "infra", Some("prod secrets"))
        .await
        .unwrap();

    Fixture {
        store,
        repositories,
        membership,
        repo_id: repo.id,
    }
}

impl Fixture {
    async fn shared_count(&self, uid: &str) -> u32 {
        self.store
            .get_user(uid)
            .await
            .unwrap()
            .unwrap()
            .repositories_shared
    }

    async fn collaborators(&self) -> Vec<String> {
        self.store
            .get_repository(&self.repo_id)
            .await
            .unwrap()
            .unwrap()
            .collaborators
    }

    async fn add(&self, email: &str) -> Result<String, AppError> {
        self.membership
            .add_collaborator(&self.repo_id, OWNER_UID, Some(OWNER_EMAIL), email)
            .await
    }
}

#[tokio::test]
async fn test_add_collaborator_increments_shared_counter() {
    let f = setup().await;

    let id = f.add(U2_EMAIL).await.unwrap();
    assert_eq!(id, f.repo_id);

    assert_eq!(f.collaborators().await, vec![U2_EMAIL]);
    assert_eq!(f.shared_count(U2_UID).await, 1);
}

#[tokio::test]
async fn test_add_twice_is_already_exists_and_changes_nothing() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();
    let before = f.store.get_repository(&f.repo_id).await.unwrap().unwrap();

    let err = f.add(U2_EMAIL).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
    assert_eq!(err.code(), codes::ALREADY_COLLABORATOR);

    let after = f.store.get_repository(&f.repo_id).await.unwrap().unwrap();
    assert_eq!(before, after);
    assert_eq!(f.shared_count(U2_UID).await, 1);
}

#[tokio::test]
async fn test_add_self_is_rejected_before_any_write() {
    let f = setup().await;

    let err = f.add(OWNER_EMAIL).await.unwrap_err();
    assert!(matches!(err, AppError::SelfCollaboration));

    assert!(f.collaborators().await.is_empty());
    assert_eq!(f.shared_count(OWNER_UID).await, 0);
}

#[tokio::test]
async fn test_add_self_without_email_claim_is_still_rejected() {
    let f = setup().await;

    // Token without an email claim: the owner's own user document is found by email instead.
    let err = f
        .membership
        .add_collaborator(&f.repo_id, OWNER_UID, None, OWNER_EMAIL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SelfCollaboration));
    assert!(f.collaborators().await.is_empty());
}

#[tokio::test]
async fn test_add_checks_run_in_order() {
    let f = setup().await;

    // Invalid email wins over everything, even a missing repository.
    let err = f
        .membership
        .add_collaborator("missing", "stranger", None, "not-an-email")
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::INVALID_EMAIL);

    // Self-collaboration is checked before the repository lookup.
    let err = f
        .membership
        .add_collaborator("missing", OWNER_UID, Some(OWNER_EMAIL), OWNER_EMAIL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SelfCollaboration));

    // Missing repository before ownership.
    let err = f
        .membership
        .add_collaborator("missing", "stranger", None, U2_EMAIL)
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::NOT_FOUND);

    // Ownership before the user lookup.
    let err = f
        .membership
        .add_collaborator(&f.repo_id, "stranger", None, "ghost@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::NOT_OWNER);

    // Finally, the collaborator must have a user document.
    let err = f.add("ghost@example.com").await.unwrap_err();
    assert_eq!(err.code(), codes::USER_NOT_FOUND);
    assert!(f.collaborators().await.is_empty());
}

#[tokio::test]
async fn test_collaborator_cannot_manage_membership() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();
    f.store
        .put_user(User::new(
            "u3-uid",
            "u3@example.com",
            "",
            "",
            "2026-01-01T00:00:00.000Z",
        ))
        .await;

    let err = f
        .membership
        .add_collaborator(&f.repo_id, U2_UID, Some(U2_EMAIL), "u3@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::NOT_OWNER);

    let err = f
        .membership
        .remove_collaborator(&f.repo_id, U2_UID, U2_EMAIL)
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::NOT_OWNER);

    assert_eq!(f.collaborators().await, vec![U2_EMAIL]);
}

#[tokio::test]
async fn test_remove_collaborator_decrements_counter() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();

    f.membership
        .remove_collaborator(&f.repo_id, OWNER_UID, U2_EMAIL)
        .await
        .unwrap();

    assert!(f.collaborators().await.is_empty());
    assert_eq!(f.shared_count(U2_UID).await, 0);
}

#[tokio::test]
async fn test_remove_absent_collaborator_mutates_nothing() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();
    let before = f.store.get_repository(&f.repo_id).await.unwrap().unwrap();

    let err = f
        .membership
        .remove_collaborator(&f.repo_id, OWNER_UID, "nobody@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::COLLABORATOR_NOT_FOUND);

    let after = f.store.get_repository(&f.repo_id).await.unwrap().unwrap();
    assert_eq!(before, after);
    assert_eq!(f.shared_count(U2_UID).await, 1);
}

#[tokio::test]
async fn test_shared_counter_never_goes_negative() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();

    // Simulate a counter that drifted to zero.
    let mut u2 = f.store.get_user(U2_UID).await.unwrap().unwrap();
    u2.repositories_shared = 0;
    f.store.put_user(u2).await;

    f.membership
        .remove_collaborator(&f.repo_id, OWNER_UID, U2_EMAIL)
        .await
        .unwrap();

    assert_eq!(f.shared_count(U2_UID).await, 0);
    assert!(f.collaborators().await.is_empty());
}

#[tokio::test]
async fn test_remove_collaborator_without_user_document() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();

    // The collaborator's email changed since they were added.
    let mut u2 = f.store.get_user(U2_UID).await.unwrap().unwrap();
    u2.email = "u2-new@example.com".to_string();
    f.store.put_user(u2).await;

    f.membership
        .remove_collaborator(&f.repo_id, OWNER_UID, U2_EMAIL)
        .await
        .unwrap();

    assert!(f.collaborators().await.is_empty());
    // Best-effort counter: left alone when no user matches.
    assert_eq!(f.shared_count(U2_UID).await, 1);
}

#[tokio::test]
async fn test_list_collaborators_requires_read_access() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();

    let list = f
        .membership
        .list_collaborators(&f.repo_id, U2_UID, Some(U2_EMAIL))
        .await
        .unwrap();
    assert_eq!(list, vec![U2_EMAIL]);

    let err = f
        .membership
        .list_collaborators(&f.repo_id, "stranger", Some("stranger@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::ACCESS_DENIED);
}

#[tokio::test]
async fn test_delete_does_not_cascade_shared_counters() {
    let f = setup().await;
    f.add(U2_EMAIL).await.unwrap();

    f.repositories.delete(&f.repo_id, OWNER_UID).await.unwrap();

    assert!(f.store.get_repository(&f.repo_id).await.unwrap().is_none());
    // Known stale counter after delete.
    assert_eq!(f.shared_count(U2_UID).await, 1);
}

#[tokio::test]
async fn test_concurrent_adds_keep_counter_consistent() {
    let f = setup().await;
    let emails: Vec<String> = (0..8).map(|n| format!("c{n}@example.com")).collect();
    for (n, email) in emails.iter().enumerate() {
        f.store
            .put_user(User::new(
                format!("c{n}-uid"),
                email.clone(),
                "",
                "",
                "2026-01-01T00:00:00.000Z",
            ))
            .await;
    }

    // One owner and repository per task, so the adds don't race on one
    // collaborator list.
    let mut handles = Vec::new();
    for (n, email) in emails.into_iter().enumerate() {
        let repositories = f.repositories.clone();
        let membership = f.membership.clone();
        handles.push(tokio::spawn(async move {
            let owner = format!("owner-{n}");
            let repo = repositories
                .create(&owner, &format!("repo-{n}"), None)
                .await
                .unwrap();
            membership
                .add_collaborator(&repo.id, &owner, None, &email)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for n in 0..8 {
        assert_eq!(f.shared_count(&format!("c{n}-uid")).await, 1);
    }
}
