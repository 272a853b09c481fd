//! CLI commands
//!
//! Command implementations for the `portal` binary. Everything except
//! `serve` acts as the operator, authenticated through the gh CLI or
//! `GITHUB_TOKEN`.

mod auth;
mod branches;
mod progress;
mod serve;
mod style;
mod submit;
mod sync;

pub use auth::{AuthAction, run_auth};
pub use branches::{run_branches, run_delete_branch, run_promote};
pub use serve::run_serve;
pub use submit::{SubmitArgs, run_submit};
pub use sync::run_sync;

use contrib_portal::auth::get_github_auth;
use contrib_portal::config::PortalConfig;
use contrib_portal::error::Result;
use contrib_portal::platform::{PlatformService, create_platform_service};

/// Platform client for the operator's own token
async fn connect(config: &PortalConfig) -> Result<Box<dyn PlatformService>> {
    let auth = get_github_auth().await?;
    tracing::debug!(source = ?auth.source, "using GitHub token");
    create_platform_service(config, &auth.token)
}
