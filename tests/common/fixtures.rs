//! Test data factories
//!
//! Not every factory is used by every test binary.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use contrib_portal::config::PortalConfig;
use contrib_portal::resources::ResourceCategory;
use contrib_portal::submit::Submission;
use contrib_portal::types::{PrState, PullRequestRecord, SubmissionKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration with fork polling shrunk to milliseconds
pub fn test_config() -> PortalConfig {
    PortalConfig {
        fork_poll_interval: Duration::from_millis(1),
        fork_ready_timeout: Duration::from_millis(200),
        ..PortalConfig::default()
    }
}

/// Stage `<root>/my-event` with an event file and a nested thumbnail
pub fn stage_event_folder(root: &Path) -> PathBuf {
    let folder = root.join("my-event");
    fs::create_dir_all(folder.join("assets")).unwrap();
    fs::write(
        folder.join("event.yml"),
        "name: My Event\nstart_date: 2025-05-01\n",
    )
    .unwrap();
    fs::write(
        folder.join("assets/thumbnail.webp"),
        [0x52, 0x49, 0x46, 0x46, 0x00, 0x01],
    )
    .unwrap();
    folder
}

/// Stage an empty folder
pub fn stage_empty_folder(root: &Path) -> PathBuf {
    let folder = root.join("empty-event");
    fs::create_dir_all(&folder).unwrap();
    folder
}

/// Submission of `My Event` for `owner` from `folder`
pub fn make_submission(owner: &str, folder: PathBuf) -> Submission {
    Submission {
        owner: owner.to_string(),
        resource_name: "My Event".to_string(),
        category: ResourceCategory::Events,
        kind: SubmissionKind::Adding,
        local_folder: folder,
        branch_name: None,
        remote_base_path: None,
    }
}

/// Open draft pull request authored from `author`'s fork
pub fn make_pull(number: u64, author: &str, head_branch: &str) -> PullRequestRecord {
    PullRequestRecord {
        id: 500 + number,
        node_id: format!("PR_seed_{number}"),
        number,
        title: format!("[EVENTS] Adding resource {number}"),
        state: PrState::Open,
        is_draft: true,
        author: author.to_string(),
        head_branch: head_branch.to_string(),
        head_owner: Some(author.to_string()),
        merged_at: None,
        html_url: format!("https://github.com/planb-network/bitcoin-educational-content/pull/{number}"),
    }
}

/// Closed pull request, merged or not
pub fn make_closed_pull(
    number: u64,
    author: &str,
    head_branch: &str,
    merged: bool,
) -> PullRequestRecord {
    PullRequestRecord {
        state: PrState::Closed,
        is_draft: false,
        merged_at: merged.then(|| Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
        ..make_pull(number, author, head_branch)
    }
}
