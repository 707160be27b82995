//! High-level pipeline: resolve the prefix, plan the uploads, dispatch them.
//!
//! This module wires the pieces of a publish run together:
//!   - Resolves the destination prefix from the versioning directive ([`crate::version`])
//!   - Plans one task per file, plus its `latest/` mirror when requested ([`crate::plan`])
//!   - Runs the tasks through the bounded dispatcher ([`crate::dispatch`]) against an
//!     [`ObjectStore`]
//!   - Builds the public URL of the upload root
//!
//! # Error Handling
//! Problems with the source path abort before any upload starts. Upload failures are
//! collected per task; every task is still attempted, and the run fails afterwards
//! reporting the first failed task (by position) and the failure count.

use std::path::PathBuf;

use tracing::{error, info};

use crate::collect::CollectError;
use crate::config::PublishConfig;
use crate::contract::{ObjectStore, UploadError};
use crate::dispatch::run_bounded;
use crate::plan::{plan_tasks, PlanOptions, SourceKind};
use crate::upload::PROVIDER_HOST;
use crate::version::versioned_out_dir;

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Public URL of the upload root.
    pub output_url: String,
    /// Number of objects written, mirrors included.
    pub uploaded: usize,
    /// Keys written, in planning order.
    pub keys: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to read source {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Scan(#[from] CollectError),

    #[error("{failed} of {total} upload(s) failed, first failure: {first}")]
    Upload {
        failed: usize,
        total: usize,
        #[source]
        first: UploadError,
    },
}

/// Publish `config.source` through `store`.
pub async fn publish<S>(config: &PublishConfig, store: &S) -> Result<PublishReport, PublishError>
where
    S: ObjectStore + ?Sized,
{
    let out_dir = versioned_out_dir(&config.versioning, &config.out_dir);
    let target_path = if out_dir.is_empty() { "(root)" } else { out_dir.as_str() };
    info!(target_path, "Target path");

    let metadata = tokio::fs::metadata(&config.source).await.map_err(|source| {
        error!(path = %config.source.display(), error = ?source, "Source is not readable");
        PublishError::Source {
            path: config.source.clone(),
            source,
        }
    })?;
    let kind = if metadata.is_file() {
        SourceKind::File
    } else {
        SourceKind::Directory
    };

    let options = PlanOptions::new(out_dir.clone(), config.upload_latest)
        .with_latest_out_dir(config.out_dir.clone());
    let tasks = plan_tasks(&config.source, kind, &options)?;

    let outcomes = run_bounded(&tasks, config.concurrency, |task| async move {
        info!(key = %task.label, path = %task.local_path.display(), "Uploading");
        let result = store.upload(&task.local_path, &task.key).await;
        if let Err(e) = &result {
            error!(key = %task.key, error = %e, "Upload failed");
        }
        result
    })
    .await;

    let total = tasks.len();
    let mut keys = Vec::with_capacity(total);
    let mut failed = 0;
    let mut first_failure = None;
    for (task, outcome) in tasks.into_iter().zip(outcomes) {
        match outcome {
            Ok(()) => keys.push(task.key),
            Err(e) => {
                failed += 1;
                first_failure.get_or_insert(e);
            }
        }
    }
    if let Some(first) = first_failure {
        error!(failed, total, "Publish finished with failed uploads");
        return Err(PublishError::Upload {
            failed,
            total,
            first,
        });
    }

    let output_url = output_url(config, &out_dir);
    info!(
        count = keys.len(),
        url = %output_url,
        "Upload complete! {} file(s) uploaded to {}",
        keys.len(),
        output_url
    );
    Ok(PublishReport {
        output_url,
        uploaded: keys.len(),
        keys,
    })
}

/// Public URL of the upload root: the CDN host when configured, otherwise the
/// bucket endpoint.
pub fn output_url(config: &PublishConfig, out_dir: &str) -> String {
    match config.cdn_domain.as_deref().filter(|d| !d.is_empty()) {
        Some(cdn) => format!("https://{cdn}/{out_dir}"),
        None => format!(
            "https://{}.{}.{}/{}",
            config.storage.bucket, config.storage.region, PROVIDER_HOST, out_dir
        ),
    }
}
