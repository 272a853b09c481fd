//! Submission engine
//!
//! Turns a staged resource folder into a draft pull request:
//! 1. Planning - derive branch, commit and pull request details
//! 2. Execution - quota check, branch, commit, draft pull request
//!
//! Also hosts the follow-up operations on submitted pull requests.

mod execute;
mod plan;
mod progress;
mod promote;

pub use execute::{
    SubmissionOutcome, count_open_pull_requests, create_pr, list_user_pull_requests,
    submit_resource,
};
pub use plan::{Submission, SubmissionPlan, create_submission_plan};
pub use progress::{NoopProgress, Phase, ProgressCallback, TracingProgress};
pub use promote::promote_to_ready;
