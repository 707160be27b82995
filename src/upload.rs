#![doc = "Object store client: puts files into a DigitalOcean Space through the S3 API."]
//
//! # SpacesClient
//!
//! Implements [`ObjectStore`] on top of `aws-sdk-s3`. The client is built once from
//! [`StorageConfig`] with static credentials and an endpoint derived from the region,
//! and is shared by every dispatcher worker.
//!
//! Each put streams the file from disk, sends its exact size as content length, the
//! configured canned ACL, and a content type picked from the file extension.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;

use crate::config::StorageConfig;
use crate::contract::{ObjectStore, UploadError};

/// Host that serves every Spaces region, e.g. `fra1.digitaloceanspaces.com`.
pub const PROVIDER_HOST: &str = "digitaloceanspaces.com";

/// Content type used when the extension is unknown.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

pub struct SpacesClient {
    client: Client,
    bucket: String,
    permission: String,
}

impl SpacesClient {
    pub fn new(storage: &StorageConfig) -> Self {
        Self::from_conf(storage, s3_config(storage))
    }

    fn from_conf(storage: &StorageConfig, config: aws_sdk_s3::config::Builder) -> Self {
        tracing::info!(
            bucket = %storage.bucket,
            endpoint = %endpoint(&storage.region),
            permission = %storage.permission,
            "Initialized Spaces client"
        );
        Self {
            client: Client::from_conf(config.build()),
            bucket: storage.bucket.clone(),
            permission: storage.permission.clone(),
        }
    }
}

fn endpoint(region: &str) -> String {
    format!("https://{region}.{PROVIDER_HOST}")
}

/// Static credentials and the regional endpoint. Checksums are only computed when
/// an operation requires them, so the sent content length is the file size.
fn s3_config(storage: &StorageConfig) -> aws_sdk_s3::config::Builder {
    let credentials = Credentials::new(
        &storage.access_key,
        &storage.secret_key,
        None,
        None,
        "spaces-publish",
    );
    aws_sdk_s3::Config::builder()
        .endpoint_url(endpoint(&storage.region))
        .region(Region::new(storage.region.clone()))
        .credentials_provider(credentials)
        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
}

#[async_trait]
impl ObjectStore for SpacesClient {
    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), UploadError> {
        let io_error = |source| UploadError::Io {
            path: local_path.to_path_buf(),
            source,
        };
        let size = tokio::fs::metadata(local_path).await.map_err(io_error)?.len();
        let body = ByteStream::from_path(local_path).await.map_err(|e| UploadError::Io {
            path: local_path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        let content_type = content_type_for(local_path);

        tracing::debug!(key, size, content_type, "Sending put-object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .acl(ObjectCannedAcl::from(self.permission.as_str()))
            .content_type(content_type)
            .content_length(size as i64)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(key, error = ?e, "put-object failed");
                UploadError::storage(key, e)
            })?;
        Ok(())
    }
}

/// Content type for a file name, looked up by extension in the MIME database.
pub fn content_type_for(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}
