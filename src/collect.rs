//! Recursive discovery of the regular files below a directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// The directory walk could not read an entry.
#[derive(Debug, thiserror::Error)]
#[error("failed to scan {}: {source}", .path.display())]
pub struct CollectError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl CollectError {
    fn at(path: &Path) -> impl FnOnce(std::io::Error) -> CollectError + '_ {
        move |source| CollectError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Returns every regular file below `root`, depth-first.
///
/// Siblings are visited in file-name order so the result is stable for a given
/// tree. Entries are classified with `fs::metadata`, so symlinks resolve to their
/// targets. Anything that is neither a file nor a directory is skipped.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>, CollectError> {
    info!(path = %root.display(), "Scanning directory");
    let mut files = Vec::new();
    visit_dir(root, &mut files)?;
    info!(path = %root.display(), count = files.len(), "Completed directory scan");
    Ok(files)
}

fn visit_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CollectError> {
    let mut entries = fs::read_dir(dir)
        .map_err(CollectError::at(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(CollectError::at(dir))?;
    entries.sort();

    for path in entries {
        let metadata = fs::metadata(&path).map_err(CollectError::at(&path))?;
        if metadata.is_file() {
            debug!(path = %path.display(), "Found file");
            files.push(path);
        } else if metadata.is_dir() {
            visit_dir(&path, files)?;
        } else {
            warn!(path = %path.display(), "Skipping entry that is neither file nor directory");
        }
    }
    Ok(())
}
