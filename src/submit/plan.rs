//! Submission planning
//!
//! Derives every name the pipeline needs from the submission form without
//! touching the network, so a plan can be shown before it is executed.

use crate::commit::{CommitRequest, commit_message};
use crate::config::PortalConfig;
use crate::error::{Error, Result};
use crate::resources::{ResourceCategory, branch_name_for, pull_request_body, pull_request_title};
use crate::types::{NewPullRequest, SubmissionKind};
use std::path::PathBuf;

/// A resource submission as received from the form
#[derive(Debug, Clone)]
pub struct Submission {
    /// Fork owner and pull request author
    pub owner: String,
    /// Human-readable resource name
    pub resource_name: String,
    /// Resource category
    pub category: ResourceCategory,
    /// New resource or edit of an existing one
    pub kind: SubmissionKind,
    /// Staging folder holding the resource files
    pub local_folder: PathBuf,
    /// Branch name to use instead of the derived one
    pub branch_name: Option<String>,
    /// Repository directory to use instead of the category's
    pub remote_base_path: Option<String>,
}

/// Everything `create_pr` will do, resolved up front
#[derive(Debug, Clone)]
pub struct SubmissionPlan {
    /// Fork owner
    pub owner: String,
    /// Topic branch to create
    pub branch_name: String,
    /// Commit to build on the topic branch
    pub commit: CommitRequest,
    /// Draft pull request to open upstream
    pub pull_request: NewPullRequest,
}

/// Create a submission plan
pub fn create_submission_plan(
    submission: &Submission,
    config: &PortalConfig,
) -> Result<SubmissionPlan> {
    let owner = submission.owner.trim();
    if owner.is_empty() {
        return Err(Error::Invalid("owner is required".to_string()));
    }
    let resource_name = submission.resource_name.trim();
    if resource_name.is_empty() {
        return Err(Error::Invalid("resource name is required".to_string()));
    }

    let branch_name = match submission.branch_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => branch_name_for(owner, resource_name)?,
    };
    let remote_base_path = submission
        .remote_base_path
        .clone()
        .unwrap_or_else(|| submission.category.remote_base_path().to_string());

    let commit = CommitRequest {
        owner: owner.to_string(),
        branch_name: branch_name.clone(),
        local_folder: submission.local_folder.clone(),
        remote_base_path,
        message: commit_message(submission.kind, resource_name),
    };

    let pull_request = NewPullRequest {
        title: pull_request_title(submission.category, submission.kind, resource_name),
        head: format!("{owner}:{branch_name}"),
        base: config.development_branch.clone(),
        body: pull_request_body(submission.kind, resource_name),
        draft: true,
    };

    Ok(SubmissionPlan {
        owner: owner.to_string(),
        branch_name,
        commit,
        pull_request,
    })
}
