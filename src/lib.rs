#![doc = "spaces-publish: upload a file or directory tree to an S3-compatible Space."]

//! The pipeline runs in four steps, each in its own module:
//!
//! - [`version`] resolves the versioning directive into a key prefix
//! - [`collect`] walks the source directory for regular files
//! - [`plan`] turns files into [`contract::UploadTask`]s, with optional `latest/` mirrors
//! - [`dispatch`] runs the tasks with a fixed concurrency ceiling
//!
//! [`publish`] ties them together against any [`contract::ObjectStore`]; [`upload`]
//! provides the aws-sdk-s3 backed implementation used by the binary.

pub mod cli;
pub mod collect;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod load_config;
pub mod plan;
pub mod publish;
pub mod upload;
pub mod version;

pub use cli::{run, Cli};
