#![forbid(unsafe_code)]

use crate::ids::{CommitSha, OrgRepoName, RepoId};

/// Cursor value of a resource that has never been claimed nor indexed.
pub const NEVER_INDEXED_MS: i64 = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repo {
    /// `None` until the store has assigned an id.
    pub repo_id: Option<RepoId>,
    pub name: OrgRepoName,
    pub default_branch_name: String,
}

impl Repo {
    pub fn new(name: OrgRepoName, default_branch_name: impl Into<String>) -> Self {
        Self {
            repo_id: None,
            name,
            default_branch_name: default_branch_name.into(),
        }
    }
}

/// Weak reference from a commit to the PR it landed through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrRef {
    pub repo_id: RepoId,
    pub number: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoCommit {
    pub sha: CommitSha,
    pub repo_id: RepoId,
    pub committed_at_ms: i64,
    pub author_email: String,
    pub associated_pr: Option<PrRef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoPr {
    pub repo_id: RepoId,
    pub number: i64,
    pub created_at_ms: i64,
    /// `None` while the PR is not merged.
    pub merged_at_ms: Option<i64>,
    pub reviewers: Vec<RepoPrReviewerStats>,
}

impl RepoPr {
    pub fn pr_ref(&self) -> PrRef {
        PrRef {
            repo_id: self.repo_id,
            number: self.number,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoPrReviewerStats {
    pub reviewer_email: String,
    pub num_comments: u32,
    pub approved: bool,
}

/// Claim/liveness state of one re-indexable unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexingCursor {
    pub indexing_began_ms: i64,
    pub indexing_finished_ms: i64,
}

impl IndexingCursor {
    pub fn never_indexed() -> Self {
        Self {
            indexing_began_ms: NEVER_INDEXED_MS,
            indexing_finished_ms: NEVER_INDEXED_MS,
        }
    }
}

/// A repo handed to a worker by a successful per-repo claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoReindexWork {
    pub repo_id: RepoId,
    pub name: OrgRepoName,
    pub default_branch_name: String,
}
