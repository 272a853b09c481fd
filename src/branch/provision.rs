//! Topic branch creation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{RepositoryRef, integration_branch_name};
use tracing::info;

/// Create `branch_name` in `owner`'s fork at the tip of their integration branch
///
/// Fails with `BaseBranchNotFound` when the integration branch is missing and
/// `BranchCreateConflict` when `branch_name` already exists. Branch names are
/// derived from owner and resource name, so a collision means the resource
/// was already submitted.
pub async fn create_branch(
    platform: &dyn PlatformService,
    owner: &str,
    branch_name: &str,
) -> Result<RepositoryRef> {
    let base_branch = integration_branch_name(owner);

    let base = platform
        .get_branch_ref(owner, &base_branch)
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => Error::BaseBranchNotFound(base_branch.clone()),
            other => other,
        })?;

    let created = platform
        .create_ref(owner, branch_name, &base.sha)
        .await
        .map_err(|e| match e {
            Error::Conflict(_) => Error::BranchCreateConflict(branch_name.to_string()),
            other => other,
        })?;

    info!(owner, branch = branch_name, base = %base_branch, sha = %created.sha, "branch created");
    Ok(created)
}
