//! # contract: shared types between the planner, the dispatcher and the object store
//!
//! This module defines the [`UploadTask`] unit of work, the per-task [`UploadError`]
//! and the [`ObjectStore`] trait that performs a single put-object call.
//!
//! ## Interface & Extensibility
//! - Implement [`ObjectStore`] to publish somewhere else (another S3 provider, a local
//!   directory, a dry-run logger).
//! - The trait only knows about a local file and a destination key. Bucket, region,
//!   credentials and ACL belong to the implementor.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, and the generated `MockObjectStore` is
//!   exported with the default `test-export-mocks` feature so integration tests can
//!   script upload outcomes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// A single file to put into the bucket under a given key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// Regular file on the local filesystem.
    pub local_path: PathBuf,
    /// Forward-slash separated object key.
    pub key: String,
    /// Human-readable label for logs.
    pub label: String,
}

impl UploadTask {
    pub fn new(local_path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            local_path: local_path.into(),
            label: key.clone(),
            key,
        }
    }

    /// Same source file published under the `latest` prefix.
    pub fn mirror(local_path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            local_path: local_path.into(),
            label: format!("{key} (latest)"),
            key,
        }
    }
}

/// Failure of one upload. Recorded per task; never aborts sibling uploads.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The local file could not be opened or stat'ed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage service rejected or failed the put-object call.
    #[error("failed to upload {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl UploadError {
    pub fn storage(key: &str, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        UploadError::Storage {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

/// Trait for putting a local file into object storage under a key.
///
/// Implementors own authentication, the access-control setting and content-type
/// detection. The trait is `Send` + `Sync` so one client can serve every worker of
/// the dispatcher concurrently.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `local_path` so it is stored under `key`.
    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), UploadError>;
}
