//! Sync command - make sure the operator's fork and integration branch are current

use crate::cli::connect;
use crate::cli::style::{Stream, Stylize, check, hyperlink_url};
use anstream::println;
use contrib_portal::config::PortalConfig;
use contrib_portal::error::Result;
use contrib_portal::workspace::ensure_user_workspace;

/// Run the sync command
pub async fn run_sync(config: &PortalConfig) -> Result<()> {
    let platform = connect(config).await?;

    let spinner = crate::cli::style::spinner(format!(
        "Synchronizing fork of {}/{}...",
        config.upstream_owner, config.repo
    ));
    let result = ensure_user_workspace(platform.as_ref(), config).await;
    spinner.finish_and_clear();
    let link = result?;

    if link.fork_created {
        println!(
            "{} Created fork {}",
            check(),
            format!("{}/{}", link.login, config.repo).accent()
        );
    }
    println!(
        "{} {} {} {}/{}",
        check(),
        link.branch.accent(),
        "synchronized with".success(),
        config.upstream_owner,
        config.development_branch.emphasis()
    );
    println!("  {}", hyperlink_url(Stream::Stdout, &link.url));
    Ok(())
}
