//! Promoting a draft pull request to ready for review

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::PullRequestRecord;
use tracing::info;

/// Mark the caller's draft pull request for `branch` as ready for review
///
/// Only a draft authored by the caller and headed from the caller's fork
/// qualifies, so a same-named branch in someone else's fork is never
/// promoted.
pub async fn promote_to_ready(
    platform: &dyn PlatformService,
    config: &PortalConfig,
    branch: &str,
) -> Result<PullRequestRecord> {
    let login = platform.current_user().await?;
    let candidates = platform
        .find_open_pulls_by_head(branch, config.promote_page_size)
        .await?;

    if candidates.is_empty() {
        return Err(Error::NotFound(format!(
            "open pull request for branch '{branch}'"
        )));
    }

    let mut pr = candidates
        .into_iter()
        .find(|pr| {
            pr.is_draft && pr.author == login && pr.head_owner.as_deref() == Some(login.as_str())
        })
        .ok_or_else(|| Error::NoDraftMatch(branch.to_string()))?;

    platform.mark_ready_for_review(&pr.node_id).await?;
    pr.is_draft = false;

    info!(login = %login, branch, number = pr.number, "pull request ready for review");
    Ok(pr)
}
