//! User profile sync.
//!
//! The first authenticated sign-in creates the user document; later
//! sign-ins only refresh `lastLoginAt`.

use crate::db::DocumentStore;
use crate::error::{codes, AppError, Missing, Result};
use crate::models::User;
use crate::time_utils::now_rfc3339;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Profile fields supplied by the client on sign-in.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[validate(length(max = 100))]
    #[serde(default)]
    pub display_name: Option<String>,
    #[validate(url)]
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the caller's user document, or record a new login.
    pub async fn sync_profile(
        &self,
        uid: &str,
        email: Option<&str>,
        mut input: ProfileInput,
    ) -> Result<User> {
        // Clients send "" for "no avatar".
        input.avatar = input.avatar.filter(|a| !a.is_empty());
        input
            .validate()
            .map_err(|e| AppError::invalid(codes::INVALID_BODY, e.to_string()))?;

        let now = now_rfc3339();

        if let Some(user) = self.store.get_user(uid).await? {
            return self.login(user, now).await;
        }

        let email = email.filter(|e| e.contains('@')).ok_or_else(|| {
            AppError::invalid(
                codes::INVALID_EMAIL,
                "Signed-in account has no email address",
            )
        })?;

        let user = User::new(
            uid,
            email,
            input.display_name.unwrap_or_default(),
            input.avatar.unwrap_or_default(),
            &now,
        );
        if self.store.create_user(&user).await? {
            tracing::info!(uid, "Created user profile");
            return Ok(user);
        }

        // A concurrent sign-in created the document first; keep its counters.
        tracing::debug!(uid, "User profile created concurrently");
        let existing = self.get_profile(uid).await?;
        self.login(existing, now).await
    }

    async fn login(&self, mut user: User, now: String) -> Result<User> {
        self.store.record_login(&user.uid, &now).await?;
        user.last_login_at = now;
        tracing::debug!(uid = %user.uid, "Recorded sign-in");
        Ok(user)
    }

    pub async fn get_profile(&self, uid: &str) -> Result<User> {
        self.store.get_user(uid).await?.ok_or_else(|| {
            AppError::NotFound(Missing::User, format!("User {uid} not found"))
        })
    }
}
