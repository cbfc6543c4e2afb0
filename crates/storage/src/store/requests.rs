#![forbid(unsafe_code)]

use crd_core::RepoId;
use std::time::Duration;

/// Inputs of a claim attempt. `ttl` is the lease duration, `period` the minimum
/// time between two completed re-indexes of the same resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReindexClaimRequest {
    pub ttl: Duration,
    pub period: Duration,
    pub now_ms: i64,
}

impl ReindexClaimRequest {
    pub(crate) fn ttl_ms(&self) -> i64 {
        super::duration_to_ms(self.ttl)
    }

    pub(crate) fn period_ms(&self) -> i64 {
        super::duration_to_ms(self.period)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListCommitsRequest {
    pub repo_id: Option<RepoId>,
    pub author_email: Option<String>,
    /// Inclusive lower bound on `committed_at_ms`.
    pub since_ms: Option<i64>,
    /// Exclusive upper bound on `committed_at_ms`.
    pub until_ms: Option<i64>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListPrsRequest {
    pub repo_id: RepoId,
    pub created_since_ms: Option<i64>,
    pub created_until_ms: Option<i64>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListReviewsRequest {
    pub reviewer_email: String,
    pub limit: usize,
    pub offset: usize,
}
