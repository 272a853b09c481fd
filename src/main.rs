//! portal - contribution portal API and operator CLI
//!
//! `portal serve` runs the HTTP API used by the web front end; the other
//! commands run the same pipeline as the authenticated operator.

use anyhow::Result;
use clap::{Parser, Subcommand};
use contrib_portal::config::PortalConfig;
use contrib_portal::resources::ResourceCategory;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

const DEFAULT_LOG_FILTER: &str = "contrib_portal=info,tower_http=info";

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Contribution portal - resource folders to draft pull requests")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "PORTAL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides PORTAL_LISTEN_ADDR)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Create or refresh your fork and integration branch
    Sync,

    /// List your topic branches
    Branches,

    /// Delete a topic branch whose pull request was merged
    DeleteBranch {
        /// Branch name
        branch: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Mark your draft pull request for a branch ready for review
    Promote {
        /// Branch name
        branch: String,
    },

    /// Submit a resource folder as a draft pull request
    Submit {
        /// Folder holding the resource files
        folder: PathBuf,

        /// Resource category (events, newsletter, professor, project, tutorial)
        #[arg(short, long)]
        category: ResourceCategory,

        /// Resource name
        #[arg(short, long)]
        name: String,

        /// Edit an existing resource instead of adding one
        #[arg(long)]
        modify: bool,

        /// Fork owner (defaults to the authenticated user)
        #[arg(long)]
        owner: Option<String>,

        /// Dry run - show what would be done without making changes
        #[arg(long)]
        dry_run: bool,

        /// Delete the folder once the submission finishes
        #[arg(long)]
        cleanup: bool,

        /// List every committed file
        #[arg(short, long)]
        verbose: bool,
    },

    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Test authentication
    Test,
    /// Show authentication setup instructions
    Setup,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = PortalConfig::from_env()?;

    match cli.command {
        Commands::Serve { listen } => cli::run_serve(config, listen).await?,
        Commands::Sync => cli::run_sync(&config).await?,
        Commands::Branches => cli::run_branches(&config).await?,
        Commands::DeleteBranch { branch, yes } => {
            cli::run_delete_branch(&config, &branch, yes).await?;
        }
        Commands::Promote { branch } => cli::run_promote(&config, &branch).await?,
        Commands::Submit {
            folder,
            category,
            name,
            modify,
            owner,
            dry_run,
            cleanup,
            verbose,
        } => {
            cli::run_submit(
                &config,
                cli::SubmitArgs {
                    folder,
                    category,
                    name,
                    modify,
                    owner,
                    dry_run,
                    cleanup,
                    verbose,
                },
            )
            .await?;
        }
        Commands::Auth { action } => {
            let action = match action {
                AuthAction::Test => cli::AuthAction::Test,
                AuthAction::Setup => cli::AuthAction::Setup,
            };
            cli::run_auth(&config, action).await?;
        }
    }

    Ok(())
}
