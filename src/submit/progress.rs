//! Progress callback trait for interface-agnostic updates
//!
//! The HTTP server reports through tracing, the operator CLI prints styled
//! terminal output; both receive the same callbacks from the pipeline.

use crate::commit::CommitOutcome;
use crate::error::Error;
use crate::types::{PullRequestRecord, RepositoryRef};
use async_trait::async_trait;
use std::fmt;
use tracing::{info, warn};

/// Submission phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Counting the user's open pull requests
    CheckingQuota,
    /// Creating the topic branch
    CreatingBranch,
    /// Uploading files and committing
    Committing,
    /// Opening the draft pull request
    OpeningPullRequest,
    /// Submission complete
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CheckingQuota => "Checking open pull requests",
            Self::CreatingBranch => "Creating branch",
            Self::Committing => "Committing files",
            Self::OpeningPullRequest => "Opening pull request",
            Self::Complete => "Done",
        };
        f.write_str(label)
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during submission.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called once the topic branch exists
    async fn on_branch_created(&self, branch: &RepositoryRef);

    /// Called once the topic branch points at the new commit
    async fn on_committed(&self, outcome: &CommitOutcome);

    /// Called when the draft pull request is open
    async fn on_pr_created(&self, pr: &PullRequestRecord);

    /// Called with the failure that stopped the pipeline
    async fn on_error(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_branch_created(&self, _branch: &RepositoryRef) {}
    async fn on_committed(&self, _outcome: &CommitOutcome) {}
    async fn on_pr_created(&self, _pr: &PullRequestRecord) {}
    async fn on_error(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}

/// Reports progress as structured log events
pub struct TracingProgress {
    /// Owner the submission runs for
    pub owner: String,
}

#[async_trait]
impl ProgressCallback for TracingProgress {
    async fn on_phase(&self, phase: Phase) {
        info!(owner = %self.owner, %phase, "submission phase");
    }

    async fn on_branch_created(&self, branch: &RepositoryRef) {
        info!(owner = %self.owner, branch = %branch.branch, sha = %branch.sha, "branch ready");
    }

    async fn on_committed(&self, outcome: &CommitOutcome) {
        info!(
            owner = %self.owner,
            commit = %outcome.commit_sha,
            files = outcome.entries.len(),
            "files committed"
        );
    }

    async fn on_pr_created(&self, pr: &PullRequestRecord) {
        info!(
            owner = %self.owner,
            number = pr.number,
            url = %pr.html_url,
            "draft pull request opened"
        );
    }

    async fn on_error(&self, error: &Error) {
        warn!(owner = %self.owner, "submission failed: {error}");
    }

    async fn on_message(&self, message: &str) {
        info!(owner = %self.owner, "{message}");
    }
}
