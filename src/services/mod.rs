// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod access;
pub mod blob_store;
pub mod firebase_auth;
pub mod membership;
pub mod rate_limit;
pub mod repositories;
pub mod request_log;
pub mod users;

pub use blob_store::{BlobError, BlobScope, BlobStore};
pub use firebase_auth::{FirebaseTokenVerifier, IdentityVerifier, TokenError, VerifiedIdentity};
pub use membership::MembershipService;
pub use rate_limit::RateLimiter;
pub use repositories::RepositoryService;
pub use request_log::{RequestLog, RequestLogEntry};
pub use users::{ProfileInput, UserService};
