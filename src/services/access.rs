// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repository access control.
//!
//! Owners are matched by uid, collaborators by email. Reads need any role;
//! writes, deletes and membership changes need the owner.

use crate::error::{codes, AppError, Result};
use crate::models::{Repository, Role};

/// Resolve the caller's role on `repository`.
pub fn evaluate(repository: &Repository, caller_uid: &str, caller_email: Option<&str>) -> Role {
    if repository.owner_id == caller_uid {
        return Role::Owner;
    }
    match caller_email {
        Some(email) if repository.has_collaborator(email) => Role::Collaborator,
        _ => Role::NoAccess,
    }
}

/// Require read access (owner or collaborator), returning the resolved role.
pub fn require_read(
    repository: &Repository,
    caller_uid: &str,
    caller_email: Option<&str>,
) -> Result<Role> {
    match evaluate(repository, caller_uid, caller_email) {
        Role::NoAccess => Err(AppError::denied(
            codes::ACCESS_DENIED,
            "You do not have access to this repository",
        )),
        role => Ok(role),
    }
}

/// Require ownership. `action` completes "Only repository owner can ...".
pub fn require_owner(repository: &Repository, caller_uid: &str, action: &str) -> Result<()> {
    if repository.owner_id == caller_uid {
        Ok(())
    } else {
        Err(AppError::denied(
            codes::NOT_OWNER,
            format!("Only repository owner can {action}"),
        ))
    }
}
