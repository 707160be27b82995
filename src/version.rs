//! Version prefix resolution.
//!
//! A versioning directive is either a manifest reference (`"true"` or a path ending in
//! `package.json`) or a literal segment such as a tag, commit SHA or branch name.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::plan::join_key;

/// Directive value that disables versioning entirely.
pub const VERSIONING_DISABLED: &str = "false";

/// Directive value that reads the manifest from the working directory.
pub const VERSION_FROM_MANIFEST: &str = "true";

pub const MANIFEST_FILE: &str = "package.json";

/// Turn a versioning directive into a path segment.
///
/// Manifest lookups never fail the run: an unreadable file, invalid JSON, a
/// top-level value that is not an object or a missing/empty `version` string all
/// resolve to the empty string.
pub fn resolve_version(directive: &str) -> String {
    if directive == VERSION_FROM_MANIFEST || directive.ends_with(MANIFEST_FILE) {
        let manifest_path = if directive == VERSION_FROM_MANIFEST {
            MANIFEST_FILE
        } else {
            directive
        };
        return match read_manifest_version(Path::new(manifest_path)) {
            Some(version) => with_v_prefix(version),
            None => String::new(),
        };
    }

    directive.to_string()
}

fn read_manifest_version(path: &Path) -> Option<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = ?e, "Could not read manifest, skipping version prefix");
            return None;
        }
    };
    let manifest: Value = match serde_json::from_str(&raw) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(path = %path.display(), error = ?e, "Could not parse manifest, skipping version prefix");
            return None;
        }
    };
    let version = manifest
        .as_object()
        .and_then(|fields| fields.get("version"))
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty());
    debug!(path = %path.display(), version = ?version, "Read manifest");
    version.map(str::to_string)
}

fn with_v_prefix(version: String) -> String {
    if version.starts_with('v') {
        version
    } else {
        format!("v{version}")
    }
}

/// Destination prefix for this run: `out_dir`, nested under the resolved version
/// unless versioning is disabled.
pub fn versioned_out_dir(directive: &str, out_dir: &str) -> String {
    if directive == VERSIONING_DISABLED {
        return join_key([out_dir]);
    }
    let version = resolve_version(directive);
    info!(version = %version, "Using version");
    join_key([version.as_str(), out_dir])
}
