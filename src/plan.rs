//! Expands a source path into the ordered list of upload tasks.

use std::path::{Component, Path};

use tracing::{debug, info};

use crate::collect::{collect_files, CollectError};
use crate::contract::UploadTask;

/// Prefix under which the version-independent copy is published.
pub const LATEST_PREFIX: &str = "latest";

/// Whether the configured source is a single file or a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

/// Destination settings for one planning pass.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Key prefix for the primary uploads (already versioned).
    pub out_dir: String,
    /// Also publish every file under `latest/`.
    pub mirror_latest: bool,
    /// Prefix placed after `latest/` for mirror uploads. The mirror is
    /// version-independent, so this is the configured out dir without the version.
    pub latest_out_dir: String,
}

impl PlanOptions {
    pub fn new(out_dir: impl Into<String>, mirror_latest: bool) -> Self {
        let out_dir = out_dir.into();
        Self {
            latest_out_dir: out_dir.clone(),
            out_dir,
            mirror_latest,
        }
    }

    pub fn with_latest_out_dir(mut self, latest_out_dir: impl Into<String>) -> Self {
        self.latest_out_dir = latest_out_dir.into();
        self
    }

    fn tasks_for(&self, local_path: &Path, relative: &str, tasks: &mut Vec<UploadTask>) {
        tasks.push(UploadTask::new(
            local_path,
            join_key([self.out_dir.as_str(), relative]),
        ));
        if self.mirror_latest {
            tasks.push(UploadTask::mirror(
                local_path,
                join_key([LATEST_PREFIX, self.latest_out_dir.as_str(), relative]),
            ));
        }
    }
}

/// Builds the upload tasks for `source`.
///
/// Each file's mirror task, when requested, directly follows its primary task.
/// Directory sources are walked with [`collect_files`]; keys use the path relative
/// to `source`.
pub fn plan_tasks(
    source: &Path,
    kind: SourceKind,
    options: &PlanOptions,
) -> Result<Vec<UploadTask>, CollectError> {
    let mut tasks = Vec::new();

    match kind {
        SourceKind::File => {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            options.tasks_for(source, &file_name, &mut tasks);
        }
        SourceKind::Directory => {
            for path in collect_files(source)? {
                let relative = path.strip_prefix(source).map_err(|_| CollectError {
                    path: path.clone(),
                    source: std::io::Error::other("file is outside the source directory"),
                })?;
                let relative = relative_key(relative);
                debug!(path = %path.display(), relative = %relative, "Planned file");
                options.tasks_for(&path, &relative, &mut tasks);
            }
        }
    }

    info!(
        count = tasks.len(),
        mirror_latest = options.mirror_latest,
        "Planned upload tasks"
    );
    Ok(tasks)
}

fn relative_key(relative: &Path) -> String {
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    join_key(segments)
}

/// Joins key segments with `/`.
///
/// Both `/` and `\` inside a segment are treated as separators. Empty and `.`
/// segments are dropped and `..` removes the previous segment, so the result never
/// has leading, trailing or doubled slashes.
pub fn join_key<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parts: Vec<String> = Vec::new();
    for segment in segments {
        for part in segment.as_ref().split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other.to_string()),
            }
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};
    use tempfile::tempdir;

    fn keys(tasks: &[UploadTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.key.as_str()).collect()
    }

    #[test]
    fn join_key_normalizes_separators() {
        assert_eq!(join_key(["v1", "a.txt"]), "v1/a.txt");
        assert_eq!(join_key(["", "a.txt"]), "a.txt");
        assert_eq!(join_key(["latest", "", "a.txt"]), "latest/a.txt");
        assert_eq!(join_key(["dist\\js", "app.js"]), "dist/js/app.js");
        assert_eq!(join_key(["/assets/", "./img//logo.png"]), "assets/img/logo.png");
        assert_eq!(join_key(["a/b", "../c"]), "a/c");
        assert_eq!(join_key(Vec::<String>::new()), "");
    }

    #[test]
    fn single_file_without_mirror() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        write(&file, "hello").unwrap();

        let tasks = plan_tasks(&file, SourceKind::File, &PlanOptions::new("v1", false)).unwrap();
        assert_eq!(keys(&tasks), vec!["v1/a.txt"]);
        assert_eq!(tasks[0].local_path, file);
    }

    #[test]
    fn single_file_with_mirror() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        write(&file, "hello").unwrap();

        let options = PlanOptions::new("v1/docs", true).with_latest_out_dir("docs");
        let tasks = plan_tasks(&file, SourceKind::File, &options).unwrap();
        assert_eq!(keys(&tasks), vec!["v1/docs/a.txt", "latest/docs/a.txt"]);
        assert!(tasks[1].key.starts_with("latest/"));
        assert_eq!(tasks[1].local_path, file);
        assert_eq!(tasks[1].label, "latest/docs/a.txt (latest)");
    }

    #[test]
    fn directory_keys_are_relative_to_source() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        create_dir_all(root.join("x")).unwrap();
        write(root.join("x/y.txt"), "y").unwrap();
        write(root.join("index.html"), "<html/>").unwrap();

        let tasks = plan_tasks(root, SourceKind::Directory, &PlanOptions::new("", false)).unwrap();
        assert_eq!(keys(&tasks), vec!["index.html", "x/y.txt"]);
        assert_eq!(tasks[1].local_path, root.join("x/y.txt"));
    }

    #[test]
    fn directory_mirror_tasks_follow_their_primary() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        write(root.join("a.css"), "").unwrap();
        write(root.join("b.js"), "").unwrap();

        let options = PlanOptions::new("v2.0.0/site", true).with_latest_out_dir("site");
        let tasks = plan_tasks(root, SourceKind::Directory, &options).unwrap();
        assert_eq!(
            keys(&tasks),
            vec![
                "v2.0.0/site/a.css",
                "latest/site/a.css",
                "v2.0.0/site/b.js",
                "latest/site/b.js",
            ]
        );
    }

    #[test]
    fn missing_directory_fails() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("gone");
        assert!(plan_tasks(&missing, SourceKind::Directory, &PlanOptions::default()).is_err());
    }
}
