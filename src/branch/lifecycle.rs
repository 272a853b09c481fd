//! Listing and deleting a user's topic branches

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{PrStateFilter, integration_branch_name};
use serde::Serialize;
use tracing::info;

/// Confirmation of a deleted branch
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBranch {
    /// Deleted branch name
    pub branch: String,
    /// Number of the merged pull request that justified deletion
    pub merged_pull_request: u64,
}

/// Whether `branch` belongs to `login`
///
/// Topic branches are named `<login>-<slug>`; the integration branch is not a
/// topic branch. Matching on the `<login>-` prefix keeps `bob` from claiming
/// `bobby-...` branches.
pub fn is_user_branch(login: &str, branch: &str) -> bool {
    if branch == integration_branch_name(login) {
        return false;
    }
    branch.len() > login.len() + 1
        && branch.is_char_boundary(login.len())
        && branch[..login.len()].eq_ignore_ascii_case(login)
        && branch[login.len()..].starts_with('-')
}

/// Topic branches in the current user's fork
pub async fn list_user_branches(platform: &dyn PlatformService) -> Result<Vec<String>> {
    let login = platform.current_user().await?;
    let branches = platform.list_branches(&login).await?;
    Ok(branches
        .into_iter()
        .filter(|branch| is_user_branch(&login, branch))
        .collect())
}

/// Delete one of the current user's branches after confirming it was merged
///
/// A closed pull request is not enough: at least one pull request headed
/// from `<login>:<branch>` must carry a merge timestamp, otherwise this fails
/// with `NoMergedPr` and nothing is deleted.
pub async fn delete_branch(platform: &dyn PlatformService, branch: &str) -> Result<DeletedBranch> {
    let login = platform.current_user().await?;
    let head = format!("{login}:{branch}");

    let closed = platform
        .list_pulls(PrStateFilter::Closed, Some(&head))
        .await?;
    let merged = closed
        .iter()
        .find(|pr| pr.merged_at.is_some())
        .ok_or_else(|| Error::NoMergedPr(branch.to_string()))?;

    platform.delete_ref(&login, branch).await?;
    info!(login = %login, branch, pr = merged.number, "merged branch deleted");

    Ok(DeletedBranch {
        branch: branch.to_string(),
        merged_pull_request: merged.number,
    })
}
