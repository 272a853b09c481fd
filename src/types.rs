//! Core types for contrib-portal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of every user's integration branch
pub const INTEGRATION_BRANCH_PREFIX: &str = "sync-repo-";

/// Name of the per-user integration branch (`sync-repo-<login>`)
pub fn integration_branch_name(login: &str) -> String {
    format!("{INTEGRATION_BRANCH_PREFIX}{login}")
}

/// A branch ref and the commit it points at
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch name (without `refs/heads/`)
    pub branch: String,
    /// Commit sha at the tip of the branch
    pub sha: String,
}

/// A commit object as read back from the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit sha
    pub sha: String,
    /// Sha of the commit's root tree
    pub tree_sha: String,
    /// Parent commit shas
    pub parents: Vec<String>,
}

/// Repository metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Owner login
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Default branch (usually `main`)
    pub default_branch: String,
    /// Whether the repository is a fork
    pub fork: bool,
}

/// Git file mode for regular files
pub const FILE_MODE: &str = "100644";

/// Kind of object a tree entry points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    /// File contents
    Blob,
}

/// One file layered onto a base tree
///
/// Paths are relative to the repository root and use forward slashes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    /// Repository path of the file
    pub path: String,
    /// Git file mode
    pub mode: String,
    /// Object kind
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
    /// Blob sha
    pub sha: String,
}

impl TreeEntry {
    /// A regular file entry
    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FILE_MODE.to_string(),
            kind: TreeEntryKind::Blob,
            sha: sha.into(),
        }
    }
}

/// Pull request state as reported by the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// Open (draft or ready)
    Open,
    /// Closed, merged or not
    Closed,
}

/// State filter for listing pull requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStateFilter {
    /// Only open pull requests
    Open,
    /// Only closed pull requests
    Closed,
    /// Every pull request
    All,
}

impl PrStateFilter {
    /// Query parameter value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// A pull request on the upstream repository
///
/// Never cached: every decision re-queries the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    /// Numeric database id
    pub id: u64,
    /// GraphQL node id (needed for draft toggling)
    pub node_id: String,
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Open or closed
    pub state: PrState,
    /// Whether the PR is still a draft
    pub is_draft: bool,
    /// Login of the PR author
    pub author: String,
    /// Head branch name
    pub head_branch: String,
    /// Owner of the head repository (None when the fork was deleted)
    pub head_owner: Option<String>,
    /// When the PR was merged, if ever
    pub merged_at: Option<DateTime<Utc>>,
    /// Web URL for the PR
    pub html_url: String,
}

impl PullRequestRecord {
    /// Whether the PR is open and authored by `login`
    pub fn is_open_by(&self, login: &str) -> bool {
        self.state == PrState::Open && self.author == login
    }
}

/// Parameters for opening a pull request on upstream
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewPullRequest {
    /// PR title
    pub title: String,
    /// `<owner>:<branch>` of the fork branch
    pub head: String,
    /// Upstream base branch
    pub base: String,
    /// PR description
    pub body: String,
    /// Open as draft
    pub draft: bool,
}

/// Whether a submission adds a new resource or edits an existing one
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubmissionKind {
    /// New resource
    #[default]
    Adding,
    /// Edit of an existing resource
    Modifying,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adding => f.write_str("Adding"),
            Self::Modifying => f.write_str("Modifying"),
        }
    }
}
