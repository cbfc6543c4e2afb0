#![forbid(unsafe_code)]

//! Reads crawler output exported as JSON files, so a crawl done elsewhere can be
//! ingested through the same claim protocol.
//!
//! Layout under the snapshot directory:
//! - `repos.json`: `[{"org_repo_name": "corp/api", "default_branch_name": "main"}]`
//! - `repos/<org>__<name>.json`: `{"prs": [...], "commits": [...]}` with RFC 3339 times.

use crate::crawler::{CrawlError, Crawler, RepoCrawl};
use crd_core::{
    CommitSha, OrgRepoName, PrRef, Repo, RepoCommit, RepoPr, RepoPrReviewerStats,
    RepoReindexWork,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RepoEntry {
    org_repo_name: String,
    default_branch_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RepoSnapshot {
    #[serde(default)]
    prs: Vec<PrEntry>,
    #[serde(default)]
    commits: Vec<CommitEntry>,
}

#[derive(Debug, Deserialize)]
struct PrEntry {
    number: i64,
    #[serde(with = "time::serde::rfc3339")]
    created: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    merged: Option<OffsetDateTime>,
    #[serde(default)]
    reviewers: Vec<ReviewerEntry>,
}

#[derive(Debug, Deserialize)]
struct ReviewerEntry {
    reviewer_email: String,
    #[serde(default)]
    num_comments: u32,
    #[serde(default)]
    approved: bool,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    sha: String,
    #[serde(with = "time::serde::rfc3339")]
    committed: OffsetDateTime,
    author_email: String,
    #[serde(default)]
    pr_number: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct SnapshotCrawler {
    dir: PathBuf,
}

impl SnapshotCrawler {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn repo_snapshot_path(&self, name: &OrgRepoName) -> PathBuf {
        self.dir
            .join("repos")
            .join(format!("{}__{}.json", name.org(), name.repo()))
    }
}

impl Crawler for SnapshotCrawler {
    fn list_repos(&mut self) -> Result<Vec<Repo>, CrawlError> {
        let entries: Vec<RepoEntry> = read_json(&self.dir.join("repos.json"))?;
        entries
            .into_iter()
            .map(|entry| {
                let name = OrgRepoName::try_new(entry.org_repo_name)
                    .map_err(|err| CrawlError::Invalid(err.message().to_string()))?;
                Ok(Repo::new(name, entry.default_branch_name))
            })
            .collect()
    }

    fn crawl_repo(&mut self, work: &RepoReindexWork) -> Result<RepoCrawl, CrawlError> {
        let path = self.repo_snapshot_path(&work.name);
        if !path.exists() {
            debug!(repo = %work.name, "no snapshot exported for repo");
            return Ok(RepoCrawl::default());
        }
        let snapshot: RepoSnapshot = read_json(&path)?;

        let prs = snapshot
            .prs
            .into_iter()
            .map(|pr| {
                Ok(RepoPr {
                    repo_id: work.repo_id,
                    number: pr.number,
                    created_at_ms: unix_ms(pr.created)?,
                    merged_at_ms: pr.merged.map(unix_ms).transpose()?,
                    reviewers: pr
                        .reviewers
                        .into_iter()
                        .map(|r| RepoPrReviewerStats {
                            reviewer_email: r.reviewer_email,
                            num_comments: r.num_comments,
                            approved: r.approved,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, CrawlError>>()?;

        let commits = snapshot
            .commits
            .into_iter()
            .map(|c| {
                Ok(RepoCommit {
                    sha: CommitSha::try_new(c.sha)
                        .map_err(|err| CrawlError::Invalid(err.message().to_string()))?,
                    repo_id: work.repo_id,
                    committed_at_ms: unix_ms(c.committed)?,
                    author_email: c.author_email,
                    associated_pr: c.pr_number.map(|number| PrRef {
                        repo_id: work.repo_id,
                        number,
                    }),
                })
            })
            .collect::<Result<Vec<_>, CrawlError>>()?;

        Ok(RepoCrawl { prs, commits })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CrawlError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| CrawlError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn unix_ms(value: OffsetDateTime) -> Result<i64, CrawlError> {
    i64::try_from(value.unix_timestamp_nanos() / 1_000_000)
        .map_err(|_| CrawlError::Invalid(format!("timestamp out of range: {value}")))
}
