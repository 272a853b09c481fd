//! Error types for contrib-portal

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline step a submission failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStep {
    /// Counting the user's open pull requests
    QuotaCheck,
    /// Creating the topic branch
    CreateBranch,
    /// Uploading the staging folder and moving the branch
    Commit,
    /// Opening the draft pull request
    OpenPullRequest,
}

impl SubmissionStep {
    /// Stable identifier used in JSON error payloads
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuotaCheck => "quota-check",
            Self::CreateBranch => "create-branch",
            Self::Commit => "commit",
            Self::OpenPullRequest => "open-pull-request",
        }
    }
}

impl fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::QuotaCheck => "checking open pull requests",
            Self::CreateBranch => "creating branch",
            Self::Commit => "committing files",
            Self::OpenPullRequest => "opening pull request",
        };
        f.write_str(label)
    }
}

/// Errors produced by the portal
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Token missing, invalid or expired
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Ref, branch, repository or pull request does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Ref already exists or a non-fast-forward update was rejected
    #[error("conflict: {0}")]
    Conflict(String),

    /// The user's integration branch is missing
    #[error("base branch '{0}' not found; sync your fork first")]
    BaseBranchNotFound(String),

    /// The topic branch already exists
    #[error("branch '{0}' already exists; this resource was probably submitted already")]
    BranchCreateConflict(String),

    /// The user already has the maximum number of open pull requests
    #[error(
        "you have {open} open pull requests and the limit is {limit}; wait for some to be reviewed before submitting more"
    )]
    QuotaExceeded {
        /// Open pull requests authored by the user
        open: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// Nothing was staged for commit
    #[error("nothing to commit: staging folder {} contains no files", .0.display())]
    EmptyCommit(PathBuf),

    /// No closed pull request for the branch was merged
    #[error("branch '{0}' has no merged pull request; refusing to delete it")]
    NoMergedPr(String),

    /// Pull requests exist for the branch but none is a draft from the caller's fork
    #[error("no draft pull request from your fork found for branch '{0}'")]
    NoDraftMatch(String),

    /// A freshly requested fork never became queryable
    #[error("fork {repo} was not ready after {waited:?}")]
    ForkNotReady {
        /// `owner/repo` of the fork
        repo: String,
        /// Total time spent polling
        waited: Duration,
    },

    /// Any other non-success platform response
    #[error("GitHub API error ({status}): {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Message reported by the platform
        message: String,
    },

    /// A list endpoint returned more items than one call will page through
    #[error("more than {limit} {what}; refusing to work from a partial listing")]
    TooManyResults {
        /// What was being listed
        what: String,
        /// Items fetched before giving up
        limit: usize,
    },

    /// A submission pipeline step failed; later steps were not attempted
    #[error("{step} failed: {source}")]
    Submission {
        /// Step that failed
        step: SubmissionStep,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Rejected input
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Bad configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Tag a failure with the pipeline step it came from
    pub fn at_step(self, step: SubmissionStep) -> Self {
        Self::Submission {
            step,
            source: Box::new(self),
        }
    }

    /// The underlying error with any pipeline tagging removed
    pub fn root(&self) -> &Self {
        match self {
            Self::Submission { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this is (or wraps) a not-found failure
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound(_))
    }

    /// Whether this is (or wraps) a ref conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), Self::Conflict(_))
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
