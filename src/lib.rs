// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHide: share encrypted environment files per repository.
//!
//! This crate provides the backend API for repositories, their
//! collaborators, and the blob storage that holds the encrypted files.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{
    BlobStore, IdentityVerifier, MembershipService, RateLimiter, RepositoryService, RequestLog,
    UserService,
};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub repositories: RepositoryService,
    pub membership: MembershipService,
    pub users: UserService,
    pub blobs: BlobStore,
    pub request_log: RequestLog,
    pub api_limiter: RateLimiter,
    pub verify_limiter: RateLimiter,
    pub started_at: Instant,
}

impl AppState {
    /// Wire services on top of a document store and identity verifier.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            repositories: RepositoryService::new(store.clone()),
            membership: MembershipService::new(store.clone()),
            users: UserService::new(store.clone()),
            blobs: BlobStore::new(&config.storage_dir),
            request_log: RequestLog::new(config.request_log_capacity),
            api_limiter: RateLimiter::new(config.rate_limit_max, config.rate_limit_window),
            verify_limiter: RateLimiter::new(
                config.auth_verify_limit_max,
                config.rate_limit_window,
            ),
            started_at: Instant::now(),
            config,
            store,
            identity,
        }
    }
}
