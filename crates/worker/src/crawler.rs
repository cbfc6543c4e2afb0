#![forbid(unsafe_code)]

use crd_core::{Repo, RepoCommit, RepoPr, RepoReindexWork};
use std::path::PathBuf;

/// Everything the crawler found for one repo in one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoCrawl {
    pub prs: Vec<RepoPr>,
    pub commits: Vec<RepoCommit>,
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid crawl data: {0}")]
    Invalid(String),
}

/// The GitHub-facing collaborator. Implementations fetch; the worker stores.
pub trait Crawler {
    fn list_repos(&mut self) -> Result<Vec<Repo>, CrawlError>;

    /// Records returned must carry `work.repo_id`.
    fn crawl_repo(&mut self, work: &RepoReindexWork) -> Result<RepoCrawl, CrawlError>;
}
