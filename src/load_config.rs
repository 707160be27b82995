//! `load_config` module: merges action inputs from flags, environment and an optional YAML
//! file into the typed [`PublishConfig`].
//!
//! # Responsibilities
//! - Accept every input as an optional string, the way a workflow runner passes them
//! - Overlay explicit inputs on top of values from the YAML file, if one is given
//! - Fill defaults (`out_dir`, `versioning`, `permission`, `concurrency`)
//! - Report *all* missing required inputs in a single error before any I/O happens
//!
//! # Errors
//! All failures are [`ConfigError`] values; the CLI surfaces them and exits non-zero.
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::{
    PublishConfig, StorageConfig, DEFAULT_CONCURRENCY, DEFAULT_PERMISSION, DEFAULT_VERSIONING,
};

/// Raw action inputs. Every field is optional here; requirements are checked by
/// [`load_config`] so that all missing keys can be reported at once.
#[derive(Debug, Default, Clone, Args)]
pub struct Inputs {
    /// File or directory to upload, relative to the working directory
    #[arg(long, env = "INPUT_SOURCE")]
    pub source: Option<String>,

    /// Destination prefix inside the Space
    #[arg(long, env = "INPUT_OUT_DIR")]
    pub out_dir: Option<String>,

    /// Name of the Space (bucket)
    #[arg(long, env = "INPUT_SPACE_NAME")]
    pub space_name: Option<String>,

    /// Region of the Space, e.g. fra1
    #[arg(long, env = "INPUT_SPACE_REGION")]
    pub space_region: Option<String>,

    /// Access key for the Spaces API
    #[arg(long, env = "INPUT_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key for the Spaces API
    #[arg(long, env = "INPUT_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// "false", "true" (read ./package.json), a path to a package.json, or a literal version
    #[arg(long, env = "INPUT_VERSIONING")]
    pub versioning: Option<String>,

    /// "true" to also upload under latest/
    #[arg(long, env = "INPUT_UPLOAD_LATEST")]
    pub upload_latest: Option<String>,

    /// Custom domain to report in the output URL
    #[arg(long, env = "INPUT_CDN_DOMAIN")]
    pub cdn_domain: Option<String>,

    /// Canned ACL for every uploaded object
    #[arg(long, env = "INPUT_PERMISSION")]
    pub permission: Option<String>,

    /// Maximum number of uploads in flight
    #[arg(long, env = "INPUT_CONCURRENCY")]
    pub concurrency: Option<String>,
}

/// YAML representation of the same inputs. Booleans and numbers may be written
/// natively in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileInputs {
    source: Option<String>,
    out_dir: Option<String>,
    space_name: Option<String>,
    space_region: Option<String>,
    access_key: Option<String>,
    secret_key: Option<String>,
    versioning: Option<String>,
    upload_latest: Option<bool>,
    cdn_domain: Option<String>,
    permission: Option<String>,
    concurrency: Option<usize>,
}

impl From<FileInputs> for Inputs {
    fn from(file: FileInputs) -> Self {
        Inputs {
            source: file.source,
            out_dir: file.out_dir,
            space_name: file.space_name,
            space_region: file.space_region,
            access_key: file.access_key,
            secret_key: file.secret_key,
            versioning: file.versioning,
            upload_latest: file.upload_latest.map(|b| b.to_string()),
            cdn_domain: file.cdn_domain,
            permission: file.permission,
            concurrency: file.concurrency.map(|n| n.to_string()),
        }
    }
}

impl Inputs {
    /// Values set in `self` win over values in `base`. Empty strings count as unset.
    pub fn overlay(self, base: Inputs) -> Inputs {
        fn pick(top: Option<String>, base: Option<String>) -> Option<String> {
            non_empty(top).or_else(|| non_empty(base))
        }
        Inputs {
            source: pick(self.source, base.source),
            out_dir: pick(self.out_dir, base.out_dir),
            space_name: pick(self.space_name, base.space_name),
            space_region: pick(self.space_region, base.space_region),
            access_key: pick(self.access_key, base.access_key),
            secret_key: pick(self.secret_key, base.secret_key),
            versioning: pick(self.versioning, base.versioning),
            upload_latest: pick(self.upload_latest, base.upload_latest),
            cdn_domain: pick(self.cdn_domain, base.cdn_domain),
            permission: pick(self.permission, base.permission),
            concurrency: pick(self.concurrency, base.concurrency),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn bullet_list(keys: &[&'static str]) -> String {
    keys.iter()
        .map(|key| format!("  - {key}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Missing required inputs:\n{}\n\nPlease check your workflow configuration.",
        bullet_list(.0)
    )]
    Missing(Vec<&'static str>),

    #[error("Invalid value {value:?} for input {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML {}: {source}", .path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Reads inputs from a YAML file. Used as the base layer under flags and env.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> Result<Inputs, ConfigError> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|source| {
        error!(error = ?source, config_path = ?path_ref, "Failed to read config file");
        ConfigError::ReadFile {
            path: path_ref.to_path_buf(),
            source,
        }
    })?;

    let file: FileInputs = serde_yaml::from_str(&content).map_err(|source| {
        error!(error = ?source, config_path = ?path_ref, "Failed to parse config YAML");
        ConfigError::ParseFile {
            path: path_ref.to_path_buf(),
            source,
        }
    })?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(file.into())
}

/// Validates `inputs` and builds the run configuration. `source` is resolved
/// against `working_dir`.
pub fn load_config(inputs: Inputs, working_dir: &Path) -> Result<PublishConfig, ConfigError> {
    let inputs = inputs.overlay(Inputs::default());

    let mut missing = Vec::new();
    let mut require = |key: &'static str, value: Option<String>| {
        value.unwrap_or_else(|| {
            missing.push(key);
            String::new()
        })
    };
    let source = require("source", inputs.source);
    let bucket = require("space_name", inputs.space_name);
    let region = require("space_region", inputs.space_region);
    let access_key = require("access_key", inputs.access_key);
    let secret_key = require("secret_key", inputs.secret_key);
    if !missing.is_empty() {
        error!(?missing, "Missing required inputs");
        return Err(ConfigError::Missing(missing));
    }

    let concurrency = match inputs.concurrency {
        None => DEFAULT_CONCURRENCY,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "concurrency",
                    value: raw,
                    reason: "must be at least 1".into(),
                })
            }
            Ok(n) => n,
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    key: "concurrency",
                    reason: e.to_string(),
                    value: raw,
                })
            }
        },
    };

    let config = PublishConfig {
        source: working_dir.join(source),
        out_dir: inputs.out_dir.unwrap_or_default(),
        versioning: inputs
            .versioning
            .unwrap_or_else(|| DEFAULT_VERSIONING.to_string()),
        upload_latest: inputs.upload_latest.as_deref() == Some("true"),
        cdn_domain: inputs.cdn_domain,
        concurrency,
        storage: StorageConfig {
            bucket,
            region,
            access_key,
            secret_key,
            permission: inputs
                .permission
                .unwrap_or_else(|| DEFAULT_PERMISSION.to_string()),
        },
    };
    info!(
        source = %config.source.display(),
        bucket = %config.storage.bucket,
        "Config loaded and merged successfully"
    );
    Ok(config)
}
