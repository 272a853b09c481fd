//! Branch commands - list, delete merged, promote drafts

use crate::cli::connect;
use crate::cli::style::{Stream, Stylize, bullet, check, hyperlink_url};
use anstream::println;
use contrib_portal::branch::{delete_branch, list_user_branches};
use contrib_portal::config::PortalConfig;
use contrib_portal::error::Result;
use contrib_portal::submit::promote_to_ready;
use dialoguer::Confirm;

/// List the operator's topic branches
pub async fn run_branches(config: &PortalConfig) -> Result<()> {
    let platform = connect(config).await?;
    let branches = list_user_branches(platform.as_ref()).await?;

    if branches.is_empty() {
        println!("{}", "No topic branches".muted());
        return Ok(());
    }
    for branch in &branches {
        println!("{} {}", bullet(), branch.accent());
    }
    Ok(())
}

/// Delete a merged topic branch, asking first unless `yes`
pub async fn run_delete_branch(config: &PortalConfig, branch: &str, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete branch {branch} from your fork?"))
            .default(false)
            .interact()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        if !confirmed {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
    }

    let platform = connect(config).await?;
    let deleted = delete_branch(platform.as_ref(), branch).await?;
    println!(
        "{} Deleted {} {}",
        check(),
        deleted.branch.accent(),
        format!("(merged in #{})", deleted.merged_pull_request).muted()
    );
    Ok(())
}

/// Mark the operator's draft PR for `branch` ready for review
pub async fn run_promote(config: &PortalConfig, branch: &str) -> Result<()> {
    let platform = connect(config).await?;
    let pr = promote_to_ready(platform.as_ref(), config, branch).await?;
    println!(
        "{} PR {} is ready for review",
        check(),
        format!("#{}", pr.number).accent()
    );
    println!("  {}", hyperlink_url(Stream::Stdout, &pr.html_url));
    Ok(())
}
