//! Submit command - open a draft PR for a local resource folder

use crate::cli::connect;
use crate::cli::progress::CliProgress;
use crate::cli::style::{Stylize, arrow, bullet};
use anstream::{eprintln, println};
use contrib_portal::commit::collect_files;
use contrib_portal::config::PortalConfig;
use contrib_portal::error::Result;
use contrib_portal::resources::ResourceCategory;
use contrib_portal::submit::{Submission, create_pr, create_submission_plan, submit_resource};
use contrib_portal::types::SubmissionKind;
use std::path::PathBuf;

/// Options of the submit command
#[derive(Debug)]
pub struct SubmitArgs {
    /// Resource folder
    pub folder: PathBuf,
    /// Resource category
    pub category: ResourceCategory,
    /// Resource name
    pub name: String,
    /// Edit of an existing resource
    pub modify: bool,
    /// Owner of the fork; defaults to the authenticated user
    pub owner: Option<String>,
    /// Print the plan without touching GitHub
    pub dry_run: bool,
    /// Delete the folder afterwards
    pub cleanup: bool,
    /// List committed files
    pub verbose: bool,
}

/// Run the submit command
pub async fn run_submit(config: &PortalConfig, args: SubmitArgs) -> Result<()> {
    let kind = if args.modify {
        SubmissionKind::Modifying
    } else {
        SubmissionKind::Adding
    };

    if args.dry_run {
        let owner = args.owner.clone().unwrap_or_else(|| "<login>".to_string());
        let submission = submission(&args, owner, kind);
        return print_plan(config, &submission);
    }

    let platform = connect(config).await?;
    let owner = match args.owner.clone() {
        Some(owner) => owner,
        None => platform.current_user().await?,
    };
    let submission = submission(&args, owner, kind);
    let progress = CliProgress {
        verbose: args.verbose,
    };

    let outcome = if args.cleanup {
        submit_resource(platform.as_ref(), config, &submission, &progress).await?
    } else {
        create_pr(platform.as_ref(), config, &submission, &progress).await?
    };

    println!(
        "{} Run {} once it is ready for review",
        arrow(),
        format!("portal promote {}", outcome.branch.branch).accent()
    );
    Ok(())
}

fn submission(args: &SubmitArgs, owner: String, kind: SubmissionKind) -> Submission {
    Submission {
        owner,
        resource_name: args.name.clone(),
        category: args.category,
        kind,
        local_folder: args.folder.clone(),
        branch_name: None,
        remote_base_path: None,
    }
}

fn print_plan(config: &PortalConfig, submission: &Submission) -> Result<()> {
    let plan = create_submission_plan(submission, config)?;
    let files = collect_files(&plan.commit.local_folder, &plan.commit.remote_base_path)?;

    println!("{}", "Dry run - no changes will be made".muted());
    println!();
    println!("{} {}", "Branch:".emphasis(), plan.branch_name.accent());
    println!("{} {}", "Commit:".emphasis(), plan.commit.message);
    println!(
        "{} {} {} {}",
        "Pull request:".emphasis(),
        plan.pull_request.title,
        arrow(),
        format!("{}/{}", config.upstream_owner, plan.pull_request.base).accent()
    );
    println!("{} ({})", "Files:".emphasis(), files.len());
    for file in &files {
        println!("  {} {}", bullet(), file.remote_path);
    }
    if files.is_empty() {
        eprintln!("{}", "Nothing to commit: the folder holds no files".warn());
    }
    Ok(())
}
