//! Committing a staging folder to a topic branch
//!
//! Uses the git data API: one blob per file, one tree on top of the base
//! commit's tree, one commit whose only parent is the integration branch
//! tip, then a fast-forward of the topic branch.

pub mod staging;

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{SubmissionKind, TreeEntry, integration_branch_name};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

pub use staging::{StagedFile, collect_files, remove_staging_folder, resolve_staging_folder};

/// What to commit and where
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// Fork owner
    pub owner: String,
    /// Topic branch receiving the commit
    pub branch_name: String,
    /// Local folder holding the files
    pub local_folder: PathBuf,
    /// Repository directory the folder lands in, e.g. `events/`
    pub remote_base_path: String,
    /// Commit message
    pub message: String,
}

/// Result of a successful commit
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    /// New commit
    pub commit_sha: String,
    /// Tree of the new commit
    pub tree_sha: String,
    /// Integration branch tip the commit was built on
    pub parent_sha: String,
    /// Files written, in upload order
    pub entries: Vec<TreeEntry>,
}

/// Commit message for a submission, e.g. `Adding My Event`
pub fn commit_message(kind: SubmissionKind, resource_name: &str) -> String {
    format!("{kind} {resource_name}")
}

/// Upload `request.local_folder` and point the topic branch at the new commit
///
/// Fails with `EmptyCommit` before any upload when the folder holds no
/// files. The branch update is never forced, so a topic branch that already
/// advanced past the integration tip rejects the commit with `Conflict`.
pub async fn commit_folder(
    platform: &dyn PlatformService,
    request: &CommitRequest,
) -> Result<CommitOutcome> {
    let owner = request.owner.as_str();

    let files = collect_files(&request.local_folder, &request.remote_base_path)?;
    if files.is_empty() {
        return Err(Error::EmptyCommit(request.local_folder.clone()));
    }

    let base_branch = integration_branch_name(owner);
    let base = platform
        .get_branch_ref(owner, &base_branch)
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => Error::BaseBranchNotFound(base_branch.clone()),
            other => other,
        })?;
    let base_commit = platform.get_commit(owner, &base.sha).await?;

    let mut entries = Vec::with_capacity(files.len());
    for file in &files {
        let bytes = tokio::fs::read(&file.local_path).await?;
        let sha = platform.create_blob(owner, &BASE64.encode(&bytes)).await?;
        debug!(path = %file.remote_path, sha = %sha, size = bytes.len(), "blob created");
        entries.push(TreeEntry::blob(file.remote_path.clone(), sha));
    }

    let tree_sha = platform
        .create_tree(owner, &base_commit.tree_sha, &entries)
        .await?;
    let commit_sha = platform
        .create_commit(
            owner,
            &request.message,
            &tree_sha,
            std::slice::from_ref(&base.sha),
        )
        .await?;
    platform
        .update_ref(owner, &request.branch_name, &commit_sha, false)
        .await?;

    info!(
        owner,
        branch = %request.branch_name,
        commit = %commit_sha,
        files = entries.len(),
        "folder committed"
    );

    Ok(CommitOutcome {
        commit_sha,
        tree_sha,
        parent_sha: base.sha,
        entries,
    })
}
