//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Firebase uid (also used as document ID)
    pub uid: String,
    /// Sign-in email; collaborators are matched on this
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    /// Avatar URL (empty if none)
    #[serde(default)]
    pub avatar: String,
    /// Number of repositories this user created
    #[serde(default)]
    pub repositories_owned: u32,
    /// Cached count of repositories listing this user as collaborator
    #[serde(default)]
    pub repositories_shared: u32,
    /// When the user first signed in (RFC3339)
    pub created_at: String,
    /// Most recent sign-in (RFC3339)
    pub last_login_at: String,
}

impl User {
    /// A freshly signed-in user with zeroed counters.
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
        avatar: impl Into<String>,
        now: &str,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: display_name.into(),
            avatar: avatar.into(),
            repositories_owned: 0,
            repositories_shared: 0,
            created_at: now.to_string(),
            last_login_at: now.to_string(),
        }
    }
}
