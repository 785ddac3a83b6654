// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod repository;
pub mod user;

pub use repository::{Repository, RepositoryPatch, RepositoryView, Role};
pub use user::User;
