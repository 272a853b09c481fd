//! Topic branches
//!
//! Creation of one branch per submission, listing a user's branches, and
//! deleting them once their content is merged.

mod lifecycle;
mod provision;

pub use lifecycle::{DeletedBranch, delete_branch, is_user_branch, list_user_branches};
pub use provision::create_branch;
