//! GitHub authentication

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use std::env;
use tokio::process::Command;

/// GitHub authentication configuration
#[derive(Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
}

impl std::fmt::Debug for GitHubAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAuthConfig")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Get GitHub authentication
///
/// Priority:
/// 1. gh CLI (`gh auth token`)
/// 2. `GITHUB_TOKEN` environment variable
/// 3. `GH_TOKEN` environment variable
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    if let Some(token) = get_gh_cli_token().await {
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = env::var(var) {
            if !token.trim().is_empty() {
                return Ok(GitHubAuthConfig {
                    token,
                    source: AuthSource::EnvVar,
                });
            }
        }
    }

    Err(Error::Auth(
        "No GitHub authentication found. Run `gh auth login` or set GITHUB_TOKEN".to_string(),
    ))
}

async fn get_gh_cli_token() -> Option<String> {
    // Check authenticated (also fails when gh is missing)
    let status = Command::new("gh")
        .args(["auth", "status"])
        .output()
        .await
        .ok()?;

    if !status.status.success() {
        return None;
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() { None } else { Some(token) }
}

/// Test GitHub authentication, returning the login the token belongs to
pub async fn test_github_auth(platform: &dyn PlatformService) -> Result<String> {
    platform.current_user().await.map_err(|e| match e {
        Error::Auth(msg) => Error::Auth(format!("Invalid token: {msg}")),
        other => other,
    })
}
