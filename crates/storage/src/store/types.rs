#![forbid(unsafe_code)]

use crd_core::RepoId;

/// One reviewer's participation in one PR, joined with the PR's dates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewRecord {
    pub repo_id: RepoId,
    pub pr_number: i64,
    pub reviewer_email: String,
    pub num_comments: u32,
    pub approved: bool,
    pub pr_created_at_ms: i64,
    pub pr_merged_at_ms: Option<i64>,
}
