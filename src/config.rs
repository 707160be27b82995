use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_PERMISSION: &str = "public-read";
pub const DEFAULT_VERSIONING: &str = "false";
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Everything one publish run needs. Read once at startup and passed down
/// by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// File or directory to publish.
    pub source: PathBuf,
    /// Key prefix inside the bucket, may be empty.
    pub out_dir: String,
    /// `"false"`, `"true"`, a path ending in `package.json`, or a literal version.
    pub versioning: String,
    /// Also publish under `latest/`.
    pub upload_latest: bool,
    /// Host to report in the output URL instead of the bucket endpoint.
    pub cdn_domain: Option<String>,
    /// Maximum number of uploads in flight.
    pub concurrency: usize,
    pub storage: StorageConfig,
}

/// Destination bucket and credentials, handed to the object store client as-is.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Canned ACL applied to every object.
    pub permission: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("permission", &self.permission)
            .finish()
    }
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            source = %self.source.display(),
            out_dir = %self.out_dir,
            versioning = %self.versioning,
            upload_latest = self.upload_latest,
            concurrency = self.concurrency,
            bucket = %self.storage.bucket,
            region = %self.storage.region,
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}
