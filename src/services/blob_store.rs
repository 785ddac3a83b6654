// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local-disk storage for opaque blobs (encrypted env files).
//!
//! Layout under the storage root:
//! - `<root>/<name>`: shared namespace of the legacy file service
//! - `<root>/.repositories/<repo_id>/<name>`: per-repository namespace
//! - `<root>/.tmp/`: staging area for atomic writes
//!
//! Dot-prefixed names are never listed and cannot be written or read by
//! clients, which keeps the internal directories out of reach.

use crate::error::{codes, AppError, Missing};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const REPOSITORIES_DIR: &str = ".repositories";
const TMP_DIR: &str = ".tmp";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob name")]
    InvalidName,
    #[error("blob not found")]
    NotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    fn from_io(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e)
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::InvalidName => AppError::invalid(codes::INVALID_FILENAME, "Invalid filename"),
            BlobError::NotFound => AppError::NotFound(Missing::File, "File not found".to_string()),
            BlobError::Io(e) => AppError::Storage(e.to_string()),
        }
    }
}

/// Which namespace a blob lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobScope<'a> {
    /// Legacy flat namespace guarded by the static token
    Shared,
    /// Namespace owned by one repository
    Repository(&'a str),
}

/// Disk-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if missing.
    pub async fn init(&self) -> Result<(), BlobError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn scope_dir(&self, scope: BlobScope<'_>) -> Result<PathBuf, BlobError> {
        match scope {
            BlobScope::Shared => Ok(self.root.clone()),
            BlobScope::Repository(repo_id) => {
                validate_name(repo_id)?;
                Ok(self.root.join(REPOSITORIES_DIR).join(repo_id))
            }
        }
    }

    fn blob_path(&self, scope: BlobScope<'_>, name: &str) -> Result<PathBuf, BlobError> {
        validate_name(name)?;
        Ok(self.scope_dir(scope)?.join(name))
    }

    /// Visible blob names in `scope`, sorted. A scope with no blobs yet is empty.
    pub async fn list(&self, scope: BlobScope<'_>) -> Result<Vec<String>, BlobError> {
        let dir = self.scope_dir(scope)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BlobError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Write `data` under `name`, replacing any existing blob atomically.
    pub async fn put(
        &self,
        scope: BlobScope<'_>,
        name: &str,
        data: &[u8],
    ) -> Result<(), BlobError> {
        let final_path = self.blob_path(scope, name)?;

        let temp_path = self.root.join(TMP_DIR).join(Uuid::new_v4().to_string());
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = Self::write_and_rename(&temp_path, &final_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(BlobError::Io(e));
        }

        tracing::debug!(name, size = data.len(), "Stored blob");
        Ok(())
    }

    async fn write_and_rename(
        temp_path: &Path,
        final_path: &Path,
        data: &[u8],
    ) -> std::io::Result<()> {
        let mut temp_file = File::create(temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;
        drop(temp_file);

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(temp_path, final_path).await
    }

    pub async fn get(&self, scope: BlobScope<'_>, name: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.blob_path(scope, name)?;
        fs::read(&path).await.map_err(BlobError::from_io)
    }

    /// Remove every blob of a repository. Missing namespaces are fine.
    pub async fn purge_repository(&self, repo_id: &str) -> Result<(), BlobError> {
        let dir = self.scope_dir(BlobScope::Repository(repo_id))?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}

fn validate_name(name: &str) -> Result<(), BlobError> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(BlobError::InvalidName);
    }
    Ok(())
}

#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}
