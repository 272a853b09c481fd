//! Submission execution
//!
//! Runs a submission as a strict pipeline: quota check, branch creation,
//! commit, draft pull request. The first failing step stops the pipeline
//! and is reported with the step it failed in.

use crate::branch::create_branch;
use crate::commit::{CommitOutcome, collect_files, commit_folder, remove_staging_folder};
use crate::config::PortalConfig;
use crate::error::{Error, Result, SubmissionStep};
use crate::platform::PlatformService;
use crate::submit::{Phase, ProgressCallback, Submission, create_submission_plan};
use crate::types::{PrStateFilter, PullRequestRecord, RepositoryRef};
use serde::Serialize;
use tracing::info;

/// Result of a completed submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    /// Topic branch created for the submission
    pub branch: RepositoryRef,
    /// Commit placed on the topic branch
    pub commit: CommitOutcome,
    /// Draft pull request opened upstream
    pub pull_request: PullRequestRecord,
}

/// Every upstream pull request authored by `login`, in any state
pub async fn list_user_pull_requests(
    platform: &dyn PlatformService,
    login: &str,
) -> Result<Vec<PullRequestRecord>> {
    let pulls = platform.list_pulls(PrStateFilter::All, None).await?;
    Ok(pulls.into_iter().filter(|pr| pr.author == login).collect())
}

/// Number of open upstream pull requests authored by `login`
///
/// Only open pull requests are listed, so closed history never pushes a
/// user's open ones out of the listing.
pub async fn count_open_pull_requests(
    platform: &dyn PlatformService,
    login: &str,
) -> Result<usize> {
    let pulls = platform.list_pulls(PrStateFilter::Open, None).await?;
    Ok(pulls.iter().filter(|pr| pr.is_open_by(login)).count())
}

async fn report(progress: &dyn ProgressCallback, err: Error) -> Error {
    progress.on_error(&err).await;
    err
}

/// Check quota, create the topic branch, commit the folder, open a draft PR
///
/// No step runs unless every earlier step succeeded. An empty staging folder
/// fails with `EmptyCommit` and a user already at the open pull request
/// ceiling gets `QuotaExceeded`, both before any branch is created. Other
/// failures come back as `Error::Submission` naming the step.
pub async fn create_pr(
    platform: &dyn PlatformService,
    config: &PortalConfig,
    submission: &Submission,
    progress: &dyn ProgressCallback,
) -> Result<SubmissionOutcome> {
    let plan = create_submission_plan(submission, config)?;
    let owner = plan.owner.as_str();

    // A branch left behind by an empty submission would block the retry
    let staged = match collect_files(&plan.commit.local_folder, &plan.commit.remote_base_path) {
        Ok(staged) => staged,
        Err(e) => return Err(report(progress, e).await),
    };
    if staged.is_empty() {
        let err = Error::EmptyCommit(plan.commit.local_folder.clone());
        return Err(report(progress, err).await);
    }

    progress.on_phase(Phase::CheckingQuota).await;
    let open = match count_open_pull_requests(platform, owner).await {
        Ok(open) => open,
        Err(e) => return Err(report(progress, e.at_step(SubmissionStep::QuotaCheck)).await),
    };
    if open >= config.open_pr_ceiling {
        let err = Error::QuotaExceeded {
            open,
            limit: config.open_pr_ceiling,
        };
        return Err(report(progress, err).await);
    }
    progress
        .on_message(&format!(
            "{open} of {} open pull requests used",
            config.open_pr_ceiling
        ))
        .await;

    progress.on_phase(Phase::CreatingBranch).await;
    let branch = match create_branch(platform, owner, &plan.branch_name).await {
        Ok(branch) => branch,
        Err(e) => return Err(report(progress, e.at_step(SubmissionStep::CreateBranch)).await),
    };
    progress.on_branch_created(&branch).await;

    progress.on_phase(Phase::Committing).await;
    let commit = match commit_folder(platform, &plan.commit).await {
        Ok(commit) => commit,
        Err(e) => return Err(report(progress, e.at_step(SubmissionStep::Commit)).await),
    };
    progress.on_committed(&commit).await;

    progress.on_phase(Phase::OpeningPullRequest).await;
    let pull_request = match platform.create_pull(&plan.pull_request).await {
        Ok(pr) => pr,
        Err(e) => {
            return Err(report(progress, e.at_step(SubmissionStep::OpenPullRequest)).await);
        }
    };
    progress.on_pr_created(&pull_request).await;

    progress.on_phase(Phase::Complete).await;
    info!(
        owner,
        branch = %plan.branch_name,
        number = pull_request.number,
        "submission complete"
    );

    Ok(SubmissionOutcome {
        branch,
        commit,
        pull_request,
    })
}

/// Run `create_pr`, then delete the staging folder whatever the outcome
pub async fn submit_resource(
    platform: &dyn PlatformService,
    config: &PortalConfig,
    submission: &Submission,
    progress: &dyn ProgressCallback,
) -> Result<SubmissionOutcome> {
    let result = create_pr(platform, config, submission, progress).await;
    remove_staging_folder(&submission.local_folder).await;
    result
}
