//! Auth command - test and explain authentication

use crate::cli::style::{Stylize, check};
use anstream::println;
use contrib_portal::auth::{get_github_auth, test_github_auth};
use contrib_portal::config::PortalConfig;
use contrib_portal::error::Result;
use contrib_portal::platform::create_platform_service;

/// Auth subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Resolve a token and ask GitHub who it belongs to
    Test,
    /// Print setup instructions
    Setup,
}

/// Run the auth test command
pub async fn run_auth_test(config: &PortalConfig) -> Result<()> {
    println!("Testing GitHub authentication...");
    let auth = get_github_auth().await?;
    let platform = create_platform_service(config, &auth.token)?;
    let username = test_github_auth(platform.as_ref()).await?;
    println!("{} Authenticated as: {}", check(), username.accent());
    println!("  Token source: {}", format!("{:?}", auth.source).muted());
    Ok(())
}

/// Run the auth setup command (show instructions)
pub fn run_auth_setup() {
    println!("{}", "GitHub Authentication Setup".emphasis());
    println!("===========================");
    println!();
    println!("The API server needs no token of its own: every request carries");
    println!("the contributor's token. Operator commands need one:");
    println!();
    println!("Option 1: GitHub CLI (recommended)");
    println!("  Install: https://cli.github.com/");
    println!("  Run: gh auth login");
    println!();
    println!("Option 2: Environment variable");
    println!("  Set GITHUB_TOKEN or GH_TOKEN");
    println!();
    println!("For GitHub Enterprise:");
    println!("  Set GH_HOST to your instance hostname");
}

/// Dispatch an auth subcommand
pub async fn run_auth(config: &PortalConfig, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Test => run_auth_test(config).await,
        AuthAction::Setup => {
            run_auth_setup();
            Ok(())
        }
    }
}
