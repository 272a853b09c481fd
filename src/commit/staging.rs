//! Local staging folders
//!
//! Submissions arrive as a folder under the staging root. This module
//! confines requested paths to that root, walks the folder into a list of
//! files with their repository paths, and removes the folder afterwards.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A local file paired with its destination path in the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// File on disk
    pub local_path: PathBuf,
    /// Forward-slash path relative to the repository root
    pub remote_path: String,
}

/// Resolve a client-supplied folder path inside `root`
///
/// Accepts paths already prefixed with the root (`temp/my-event`) or relative
/// to it (`my-event`). Parent components and absolute paths outside the root
/// are rejected.
pub fn resolve_staging_folder(root: &Path, requested: &str) -> Result<PathBuf> {
    let requested = Path::new(requested.trim());
    if requested.as_os_str().is_empty() {
        return Err(Error::Invalid("folder path is empty".to_string()));
    }
    if requested
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::Invalid(format!(
            "folder path {} may not contain '..'",
            requested.display()
        )));
    }

    let resolved = if requested.starts_with(root) {
        requested.to_path_buf()
    } else if requested.has_root() {
        return Err(Error::Invalid(format!(
            "folder path {} is outside the staging area",
            requested.display()
        )));
    } else {
        root.join(requested)
    };

    if resolved == root {
        return Err(Error::Invalid(
            "folder path must name a folder inside the staging area".to_string(),
        ));
    }
    Ok(resolved)
}

/// Normalize a repository directory: forward slashes, no leading or trailing slash
pub fn normalize_remote_base(remote_base_path: &str) -> String {
    remote_base_path
        .replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Repository path for a file at `relative` inside the folder `folder_name`
pub fn remote_path_for(remote_base: &str, folder_name: &str, relative: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !remote_base.is_empty() {
        parts.push(remote_base.to_string());
    }
    parts.push(folder_name.to_string());
    parts.extend(relative.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    }));
    parts.join("/")
}

/// Every regular file under `folder`, sorted, with its repository path
///
/// Paths take the form `<remote_base>/<folder name>/<relative path>`.
pub fn collect_files(folder: &Path, remote_base_path: &str) -> Result<Vec<StagedFile>> {
    let folder_name = folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::Invalid(format!("{} does not name a folder", folder.display()))
        })?;
    let remote_base = normalize_remote_base(remote_base_path);

    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(folder).map_err(|_| {
            Error::Invalid(format!(
                "{} escaped the staging folder",
                entry.path().display()
            ))
        })?;
        let remote_path = remote_path_for(&remote_base, &folder_name, relative);
        if !seen.insert(remote_path.clone()) {
            return Err(Error::Invalid(format!(
                "two staged files map to {remote_path}"
            )));
        }

        debug!(local = %entry.path().display(), remote = %remote_path, "staged file");
        files.push(StagedFile {
            local_path: entry.into_path(),
            remote_path,
        });
    }

    Ok(files)
}

/// Remove a staging folder; failures are logged and otherwise ignored
pub async fn remove_staging_folder(folder: &Path) {
    match tokio::fs::remove_dir_all(folder).await {
        Ok(()) => debug!(folder = %folder.display(), "staging folder removed"),
        Err(e) => warn!(folder = %folder.display(), "failed to remove staging folder: {e}"),
    }
}
