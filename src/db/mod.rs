//! Database layer (Firestore).
//!
//! Services talk to the [`DocumentStore`] trait; [`FirestoreDb`] is the
//! production implementation and [`MemoryStore`] backs tests and local runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Repository, RepositoryPatch, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const REPOSITORIES: &str = "repositories";
}

/// Per-user counters cached on the user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    RepositoriesOwned,
    RepositoriesShared,
}

impl Counter {
    /// Firestore field name.
    pub fn field(self) -> &'static str {
        match self {
            Counter::RepositoriesOwned => "repositoriesOwned",
            Counter::RepositoriesShared => "repositoriesShared",
        }
    }

    pub fn value(self, user: &User) -> u32 {
        match self {
            Counter::RepositoriesOwned => user.repositories_owned,
            Counter::RepositoriesShared => user.repositories_shared,
        }
    }

    /// Move the counter by `delta`, never below zero.
    pub fn adjust(self, user: &mut User, delta: i32) {
        let slot = match self {
            Counter::RepositoriesOwned => &mut user.repositories_owned,
            Counter::RepositoriesShared => &mut user.repositories_shared,
        };
        *slot = slot.saturating_add_signed(delta);
    }
}

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    Add,
    Remove,
}

impl MembershipOp {
    /// Effect on the collaborator's `repositoriesShared`.
    pub fn counter_delta(self) -> i32 {
        match self {
            MembershipOp::Add => 1,
            MembershipOp::Remove => -1,
        }
    }
}

/// One email added to or removed from one repository's collaborators.
///
/// Stores apply it against the repository as it is at commit time, so
/// concurrent changes to the same list or the same counter never overwrite
/// each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub repo_id: String,
    pub email: String,
    pub op: MembershipOp,
    /// Collaborator whose `repositoriesShared` follows the list; `None` when
    /// the email has no user document.
    pub collaborator_uid: Option<String>,
    pub updated_at: String,
}

impl MembershipChange {
    /// Apply the change to `collaborators`. Returns `false` when the list
    /// already reflects it (email present on add, absent on remove).
    pub fn apply_to(&self, collaborators: &mut Vec<String>) -> bool {
        let present = collaborators.iter().any(|c| c == &self.email);
        match self.op {
            MembershipOp::Add if !present => collaborators.push(self.email.clone()),
            MembershipOp::Remove if present => collaborators.retain(|c| c != &self.email),
            _ => return false,
        }
        true
    }
}

/// What a store found when applying a [`MembershipChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOutcome {
    Applied,
    /// The list already reflected the change; nothing was written.
    Unchanged,
    RepositoryMissing,
}

/// Collection-based document store holding `users` and `repositories`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError>;

    /// First user whose `email` equals `email` exactly.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Create a user document. Returns `false`, writing nothing, if one
    /// already exists for `user.uid`.
    async fn create_user(&self, user: &User) -> Result<bool, AppError>;

    /// Set `lastLoginAt` without touching other fields.
    async fn record_login(&self, uid: &str, at: &str) -> Result<(), AppError>;

    // ─── Repositories ────────────────────────────────────────────

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>, AppError>;

    async fn repositories_owned_by(&self, uid: &str) -> Result<Vec<Repository>, AppError>;

    /// Repositories whose `collaborators` contains `email`.
    async fn repositories_shared_with(&self, email: &str) -> Result<Vec<Repository>, AppError>;

    /// Insert a new repository and bump the owner's `repositoriesOwned` (when
    /// the owner has a user document) in the same commit. Returns `false`,
    /// writing nothing, if the ID is taken.
    async fn create_repository(&self, repository: &Repository) -> Result<bool, AppError>;

    /// Field-level update: only fields present in `patch` plus `updatedAt` are written.
    async fn update_repository(
        &self,
        repo_id: &str,
        patch: &RepositoryPatch,
        updated_at: &str,
    ) -> Result<(), AppError>;

    async fn delete_repository(&self, repo_id: &str) -> Result<(), AppError>;

    /// Apply a collaborator change and the matching counter change together.
    async fn apply_membership(
        &self,
        change: &MembershipChange,
    ) -> Result<MembershipOutcome, AppError>;
}
