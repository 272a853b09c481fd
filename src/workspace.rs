//! Per-user fork and integration branch
//!
//! Every user works from a fork of upstream holding a `sync-repo-<login>`
//! branch that mirrors upstream's development branch. Topic branches are
//! cut from that mirror.

use crate::config::{IntegrationSource, PortalConfig};
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::integration_branch_name;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shortest wait between two fork-existence polls
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Longest wait between two fork-existence polls
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Result of synchronizing a user's workspace
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceLink {
    /// The user's login
    pub login: String,
    /// Integration branch name
    pub branch: String,
    /// Browsable link to the integration branch
    pub url: String,
    /// Whether the fork had to be created during this call
    pub fork_created: bool,
}

/// Make sure the user's fork and integration branch exist and are current
///
/// An existing integration branch is force-moved to upstream's development
/// tip, discarding anything committed to it directly. A missing one is
/// created from the configured source; losing a creation race to a
/// concurrent call is not an error.
pub async fn ensure_user_workspace(
    platform: &dyn PlatformService,
    config: &PortalConfig,
) -> Result<WorkspaceLink> {
    let login = platform.current_user().await?;
    let fork_created = ensure_fork(platform, config, &login).await?;
    let branch = integration_branch_name(&login);

    match platform.get_branch_ref(&login, &branch).await {
        Ok(existing) => {
            let upstream_tip = platform
                .get_branch_ref(&config.upstream_owner, &config.development_branch)
                .await?;
            platform
                .update_ref(&login, &branch, &upstream_tip.sha, true)
                .await?;
            info!(
                login = %login,
                branch = %branch,
                from = %existing.sha,
                to = %upstream_tip.sha,
                "integration branch synchronized with upstream"
            );
        }
        Err(Error::NotFound(_)) => {
            let source_sha = integration_source_sha(platform, config, &login).await?;
            match platform.create_ref(&login, &branch, &source_sha).await {
                Ok(_) => info!(login = %login, branch = %branch, "integration branch created"),
                Err(Error::Conflict(msg)) => {
                    warn!(
                        login = %login,
                        branch = %branch,
                        "integration branch already exists, skipping creation: {msg}"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(e) => return Err(e),
    }

    Ok(WorkspaceLink {
        url: config.branch_url(&login, &branch),
        login,
        branch,
        fork_created,
    })
}

/// Create the user's fork if missing; returns whether it was created
///
/// A same-named repository that is not a fork cannot receive upstream's
/// history and fails with `Conflict`.
async fn ensure_fork(
    platform: &dyn PlatformService,
    config: &PortalConfig,
    login: &str,
) -> Result<bool> {
    if let Some(existing) = platform.get_repository(login).await? {
        if !existing.fork {
            return Err(Error::Conflict(format!(
                "{login}/{} exists but is not a fork of {}/{}",
                config.repo, config.upstream_owner, config.repo
            )));
        }
        debug!(login, repo = %config.repo, "fork found");
        return Ok(false);
    }

    info!(login, repo = %config.repo, "fork not found, creating one");
    platform.create_fork().await?;
    wait_for_fork(platform, config, login).await?;
    info!(login, repo = %config.repo, "fork created");
    Ok(true)
}

/// Poll until the new fork is queryable, backing off between attempts
///
/// Fork creation is asynchronous on GitHub; gives up with `ForkNotReady`
/// once `fork_ready_timeout` has elapsed.
async fn wait_for_fork(
    platform: &dyn PlatformService,
    config: &PortalConfig,
    login: &str,
) -> Result<()> {
    let started = Instant::now();
    let mut delay = config.fork_poll_interval.max(MIN_POLL_INTERVAL);

    loop {
        let remaining = config.fork_ready_timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(Error::ForkNotReady {
                repo: format!("{login}/{}", config.repo),
                waited: started.elapsed(),
            });
        }

        tokio::time::sleep(delay.min(remaining)).await;

        if platform.get_repository(login).await?.is_some() {
            return Ok(());
        }
        debug!(login, ?delay, "fork not ready yet");
        delay = (delay * 2).min(MAX_POLL_INTERVAL);
    }
}

async fn integration_source_sha(
    platform: &dyn PlatformService,
    config: &PortalConfig,
    login: &str,
) -> Result<String> {
    let tip = match config.integration_source {
        IntegrationSource::UpstreamDevelopment => {
            platform
                .get_branch_ref(&config.upstream_owner, &config.development_branch)
                .await?
        }
        IntegrationSource::ForkDefault => {
            let default_branch = platform
                .get_repository(login)
                .await?
                .map_or_else(|| "main".to_string(), |repo| repo.default_branch);
            platform.get_branch_ref(login, &default_branch).await?
        }
    };
    Ok(tip.sha)
}
