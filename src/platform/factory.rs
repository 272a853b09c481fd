//! Platform service factory

use crate::config::PortalConfig;
use crate::error::{Error, Result};
use crate::platform::{GitHubService, PlatformService};

/// Create a platform service for one user's token
pub fn create_platform_service(
    config: &PortalConfig,
    token: &str,
) -> Result<Box<dyn PlatformService>> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Auth("missing GitHub token".to_string()));
    }
    Ok(Box::new(GitHubService::new(config, token)?))
}
