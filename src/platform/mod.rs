//! Hosting platform access
//!
//! Every operation the pipeline performs against the remote platform goes
//! through [`PlatformService`], so the pipeline can run against GitHub or an
//! in-memory double in tests.

mod factory;
mod github;

pub use factory::create_platform_service;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    CommitInfo, NewPullRequest, PrStateFilter, PullRequestRecord, RepositoryInfo, RepositoryRef,
    TreeEntry,
};
use async_trait::async_trait;

/// Location of the upstream repository a service talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRepo {
    /// Upstream owner
    pub owner: String,
    /// Repository name, shared by every fork
    pub repo: String,
}

/// Authenticated access to the hosting platform's object model
///
/// A service is bound to one user's token. Methods taking `owner` address
/// `<owner>/<repo>` (the user's fork, or upstream when given the upstream
/// owner); pull request methods always address upstream.
///
/// No method retries: failures propagate immediately.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Login of the token's owner
    async fn current_user(&self) -> Result<String>;

    /// Repository metadata, `None` when it does not exist
    async fn get_repository(&self, owner: &str) -> Result<Option<RepositoryInfo>>;

    /// Request a fork of upstream into the token owner's namespace
    async fn create_fork(&self) -> Result<()>;

    /// Read `refs/heads/<branch>`
    async fn get_branch_ref(&self, owner: &str, branch: &str) -> Result<RepositoryRef>;

    /// Create `refs/heads/<branch>` at `sha`; fails with `Conflict` if it exists
    async fn create_ref(&self, owner: &str, branch: &str, sha: &str) -> Result<RepositoryRef>;

    /// Move `refs/heads/<branch>` to `sha`
    ///
    /// Without `force` the update must be a fast-forward.
    async fn update_ref(
        &self,
        owner: &str,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<RepositoryRef>;

    /// Delete `refs/heads/<branch>`
    async fn delete_ref(&self, owner: &str, branch: &str) -> Result<()>;

    /// Read a commit object
    async fn get_commit(&self, owner: &str, sha: &str) -> Result<CommitInfo>;

    /// Upload base64-encoded file contents, returning the blob sha
    async fn create_blob(&self, owner: &str, content_base64: &str) -> Result<String>;

    /// Create a tree layered on `base_tree`, returning the tree sha
    async fn create_tree(
        &self,
        owner: &str,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String>;

    /// Create a commit object, returning its sha
    async fn create_commit(
        &self,
        owner: &str,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String>;

    /// List upstream pull requests, optionally filtered by `<owner>:<branch>` head
    async fn list_pulls(
        &self,
        state: PrStateFilter,
        head: Option<&str>,
    ) -> Result<Vec<PullRequestRecord>>;

    /// Open a pull request on upstream
    async fn create_pull(&self, pull: &NewPullRequest) -> Result<PullRequestRecord>;

    /// Names of every branch in `<owner>/<repo>`
    async fn list_branches(&self, owner: &str) -> Result<Vec<String>>;

    /// Raw contents of a file at `git_ref`
    async fn get_file_contents(&self, owner: &str, path: &str, git_ref: &str) -> Result<String>;

    /// Open upstream pull requests whose head ref is `branch` (at most `limit`)
    async fn find_open_pulls_by_head(
        &self,
        branch: &str,
        limit: u32,
    ) -> Result<Vec<PullRequestRecord>>;

    /// Remove draft status from a pull request
    async fn mark_ready_for_review(&self, node_id: &str) -> Result<()>;
}
