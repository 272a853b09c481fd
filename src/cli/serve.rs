//! Serve command - run the HTTP API

use contrib_portal::config::PortalConfig;
use contrib_portal::error::Result;
use contrib_portal::server;
use tracing::info;

/// Run the HTTP API until interrupted
pub async fn run_serve(mut config: PortalConfig, listen: Option<String>) -> Result<()> {
    if let Some(addr) = listen {
        config.listen_addr = addr;
    }
    tokio::fs::create_dir_all(&config.staging_root).await?;

    info!(
        upstream = %format!("{}/{}", config.upstream_owner, config.repo),
        base = %config.development_branch,
        staging = %config.staging_root.display(),
        "starting portal API"
    );
    server::serve(config).await
}
