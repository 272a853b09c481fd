//! CLI progress callback with styled output

use crate::cli::style::{Stream, Stylize, check, cross, hyperlink_url};
use anstream::{eprintln, println};
use async_trait::async_trait;
use contrib_portal::commit::CommitOutcome;
use contrib_portal::error::Error;
use contrib_portal::submit::{Phase, ProgressCallback};
use contrib_portal::types::{PullRequestRecord, RepositoryRef};

/// Prints each pipeline step as it happens
///
/// Verbose mode also lists every file written by the commit.
pub struct CliProgress {
    /// List committed files
    pub verbose: bool,
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        if phase != Phase::Complete {
            println!("{}...", phase.to_string().emphasis());
        }
    }

    async fn on_branch_created(&self, branch: &RepositoryRef) {
        println!(
            "  {} Created branch {} {}",
            check(),
            branch.branch.accent(),
            short_sha(&branch.sha).muted()
        );
    }

    async fn on_committed(&self, outcome: &CommitOutcome) {
        println!(
            "  {} Committed {} file(s) as {}",
            check(),
            outcome.entries.len().accent(),
            short_sha(&outcome.commit_sha).muted()
        );
        if self.verbose {
            for entry in &outcome.entries {
                println!("    {}", entry.path.muted());
            }
        }
    }

    async fn on_pr_created(&self, pr: &PullRequestRecord) {
        let number = format!("#{}", pr.number);
        println!(
            "  {} Opened draft PR {} {}",
            check(),
            number.accent(),
            pr.title.emphasis()
        );
        println!("    {}", hyperlink_url(Stream::Stdout, &pr.html_url));
    }

    async fn on_error(&self, err: &Error) {
        eprintln!("  {} {}", cross(), err.to_string().error());
    }

    async fn on_message(&self, message: &str) {
        println!("  {}", message.muted());
    }
}

/// First seven characters of a sha
pub fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
