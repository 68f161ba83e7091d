//! Enumerates the files eligible for scanning: everything in the git index,
//! minus ignored prefixes and entries that no longer exist on disk.

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use libupnotify_core::UpnotifyError;

/// A tracked file eligible for scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    /// Path relative to the repository root, as recorded in the index
    pub name: String,
    /// Absolute path on disk
    pub path: PathBuf,
}

/// List tracked files in index order (the index is path-sorted, so the scan
/// ordering is canonical and re-runs see the same order).
pub fn tracked_files(
    repo_path: &Path,
    ignore_prefixes: &[String],
) -> Result<Vec<TrackedFile>, UpnotifyError> {
    let repo = Repository::discover(repo_path).map_err(|e| {
        UpnotifyError::Repo(format!("open repository at {}: {}", repo_path.display(), e))
    })?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| UpnotifyError::Repo("repository has no working directory".to_string()))?
        .to_path_buf();
    let index = repo
        .index()
        .map_err(|e| UpnotifyError::Repo(format!("read index: {e}")))?;

    let mut files = Vec::new();
    for entry in index.iter() {
        let name = match String::from_utf8(entry.path.clone()) {
            Ok(name) => name,
            // Nothing we could render a link to
            Err(_) => continue,
        };
        if ignore_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && name.starts_with(prefix))
        {
            debug!(file = %name, "ignoring file under ignored prefix");
            continue;
        }
        let path = workdir.join(&name);
        if !path.is_file() {
            continue;
        }
        files.push(TrackedFile { name, path });
    }
    Ok(files)
}
