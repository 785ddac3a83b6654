// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and cached counters)
//! - Repositories (metadata and collaborator lists)

use crate::db::{collections, Counter, DocumentStore, MembershipChange, MembershipOutcome};
use crate::error::AppError;
use crate::models::{Repository, RepositoryPatch, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreResult, FirestoreTransaction, FirestoreWritePrecondition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Repository document body. The ID lives only in the document name and is
/// read back through `_firestore_id`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryDocument {
    name: String,
    description: String,
    owner_id: String,
    collaborators: Vec<String>,
    created_at: String,
    updated_at: String,
}

impl From<&Repository> for RepositoryDocument {
    fn from(repository: &Repository) -> Self {
        Self {
            name: repository.name.clone(),
            description: repository.description.clone(),
            owner_id: repository.owner_id.clone(),
            collaborators: repository.collaborators.clone(),
            created_at: repository.created_at.clone(),
            updated_at: repository.updated_at.clone(),
        }
    }
}

/// Field-masked repository write.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collaborators: Option<Vec<String>>,
    updated_at: String,
}

async fn read_user(db: &firestore::FirestoreDb, uid: &str) -> FirestoreResult<Option<User>> {
    db.fluent()
        .select()
        .by_id_in(collections::USERS)
        .obj()
        .one(uid)
        .await
}

/// Queue a write of `user`'s current `counter` value into `transaction`.
fn queue_counter(
    db: &firestore::FirestoreDb,
    user: &User,
    counter: Counter,
    transaction: &mut FirestoreTransaction<'_>,
) -> FirestoreResult<()> {
    let field = counter.field();
    let mut doc = BTreeMap::new();
    doc.insert(field.to_string(), counter.value(user));

    db.fluent()
        .update()
        .fields([field])
        .in_col(collections::USERS)
        .precondition(FirestoreWritePrecondition::Exists(true))
        .document_id(&user.uid)
        .object(&doc)
        .add_to_transaction(transaction)?;
    Ok(())
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any bearer token; skip credential discovery entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        read_user(self.get_client()?, uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        let result: FirestoreResult<()> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn record_login(&self, uid: &str, at: &str) -> Result<(), AppError> {
        let mut doc = BTreeMap::new();
        doc.insert("lastLoginAt".to_string(), at.to_string());

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["lastLoginAt"])
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Repository Operations ───────────────────────────────────

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REPOSITORIES)
            .obj()
            .one(repo_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn repositories_owned_by(&self, uid: &str) -> Result<Vec<Repository>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REPOSITORIES)
            .filter(|q| q.for_all([q.field("ownerId").eq(uid)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn repositories_shared_with(&self, email: &str) -> Result<Vec<Repository>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REPOSITORIES)
            .filter(|q| q.for_all([q.field("collaborators").array_contains(email)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The ID check and the owner read go through the transaction, so a
    /// conflicting commit makes Firestore retry with fresh data.
    async fn create_repository(&self, repository: &Repository) -> Result<bool, AppError> {
        let created = self
            .get_client()?
            .run_transaction::<bool, _, FirestoreError>(|db, transaction| {
                let repo_id = repository.id.clone();
                let owner_uid = repository.owner_id.clone();
                let document = RepositoryDocument::from(repository);
                Box::pin(async move {
                    let existing: Option<RepositoryDocument> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::REPOSITORIES)
                        .obj()
                        .one(&repo_id)
                        .await?;
                    if existing.is_some() {
                        return Ok(false);
                    }
                    let owner = read_user(&db, &owner_uid).await?;

                    db.fluent()
                        .update()
                        .in_col(collections::REPOSITORIES)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&repo_id)
                        .object(&document)
                        .add_to_transaction(transaction)?;

                    if let Some(mut owner) = owner {
                        Counter::RepositoriesOwned.adjust(&mut owner, 1);
                        queue_counter(&db, &owner, Counter::RepositoriesOwned, transaction)?;
                    }
                    Ok(true)
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Create transaction failed: {}", e)))?;

        if created {
            tracing::debug!(repo_id = %repository.id, "Repository document created");
        }
        Ok(created)
    }

    async fn update_repository(
        &self,
        repo_id: &str,
        patch: &RepositoryPatch,
        updated_at: &str,
    ) -> Result<(), AppError> {
        let mut fields = vec!["updatedAt"];
        if patch.name.is_some() {
            fields.push("name");
        }
        if patch.description.is_some() {
            fields.push("description");
        }

        let doc = RepositoryFields {
            name: patch.name.clone(),
            description: patch.description.clone(),
            collaborators: None,
            updated_at: updated_at.to_string(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::REPOSITORIES)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(repo_id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_repository(&self, repo_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::REPOSITORIES)
            .document_id(repo_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Membership ──────────────────────────────────────────────

    /// The repository and the collaborator are read inside the transaction
    /// and the change is applied to what is there. A concurrent commit on
    /// either document aborts this one and Firestore retries it.
    async fn apply_membership(
        &self,
        change: &MembershipChange,
    ) -> Result<MembershipOutcome, AppError> {
        let outcome = self
            .get_client()?
            .run_transaction::<MembershipOutcome, _, FirestoreError>(|db, transaction| {
                let change = change.clone();
                Box::pin(async move {
                    let repository: Option<Repository> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::REPOSITORIES)
                        .obj()
                        .one(&change.repo_id)
                        .await?;
                    let Some(mut repository) = repository else {
                        return Ok(MembershipOutcome::RepositoryMissing);
                    };
                    let collaborator = match &change.collaborator_uid {
                        Some(uid) => read_user(&db, uid).await?,
                        None => None,
                    };

                    if !change.apply_to(&mut repository.collaborators) {
                        return Ok(MembershipOutcome::Unchanged);
                    }

                    let doc = RepositoryFields {
                        collaborators: Some(repository.collaborators),
                        updated_at: change.updated_at.clone(),
                        ..Default::default()
                    };
                    db.fluent()
                        .update()
                        .fields(["collaborators", "updatedAt"])
                        .in_col(collections::REPOSITORIES)
                        .precondition(FirestoreWritePrecondition::Exists(true))
                        .document_id(&change.repo_id)
                        .object(&doc)
                        .add_to_transaction(transaction)?;

                    if let Some(mut user) = collaborator {
                        Counter::RepositoriesShared.adjust(&mut user, change.op.counter_delta());
                        queue_counter(&db, &user, Counter::RepositoriesShared, transaction)?;
                    }
                    Ok(MembershipOutcome::Applied)
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Membership transaction failed: {}", e)))?;

        tracing::debug!(
            repo_id = %change.repo_id,
            op = ?change.op,
            outcome = ?outcome,
            "Membership change committed"
        );
        Ok(outcome)
    }
}

