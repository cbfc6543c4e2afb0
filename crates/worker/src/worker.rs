#![forbid(unsafe_code)]

use crate::config::WorkerConfig;
use crate::crawler::{CrawlError, Crawler, RepoCrawl};
use crd_core::{OrgRepoName, RepoReindexWork};
use crd_storage::{ReindexClaimRequest, SqliteStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use tracing::{info, warn};

type Clock = Box<dyn Fn() -> i64 + Send>;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Crawl(#[from] CrawlError),
}

/// What a single poll accomplished.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub reindexed_all: bool,
    pub repos_listed: usize,
    pub repo: Option<OrgRepoName>,
}

impl TickOutcome {
    pub fn is_idle(&self) -> bool {
        !self.reindexed_all && self.repo.is_none()
    }
}

/// One polling worker. Any number of these may share a database; the claim
/// statements guarantee a resource is worked by at most one live lease.
pub struct Worker<C> {
    store: SqliteStore,
    crawler: C,
    config: WorkerConfig,
    clock: Clock,
}

impl<C: Crawler> Worker<C> {
    pub fn new(store: SqliteStore, crawler: C, config: WorkerConfig) -> Self {
        Self {
            store,
            crawler,
            config,
            clock: Box::new(crd_storage::now_ms),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn crawler_mut(&mut self) -> &mut C {
        &mut self.crawler
    }

    fn claim_request(&self) -> ReindexClaimRequest {
        ReindexClaimRequest {
            ttl: self.config.reindex_ttl,
            period: self.config.reindex_period,
            now_ms: (self.clock)(),
        }
    }

    /// Tries the global re-list, then one per-repo re-index. On error the claimed
    /// resource is left unfinished so another worker takes it over after the TTL.
    pub fn tick(&mut self) -> Result<TickOutcome, WorkerError> {
        let mut outcome = TickOutcome::default();

        if self.store.try_claim_reindex_all(&self.claim_request())? {
            outcome.repos_listed = self.reindex_all()?;
            outcome.reindexed_all = true;
        }

        if let Some(work) = self.store.try_claim_repo(&self.claim_request())? {
            self.reindex_repo(&work)?;
            outcome.repo = Some(work.name);
        }

        Ok(outcome)
    }

    fn reindex_all(&mut self) -> Result<usize, WorkerError> {
        let mut repos = self.crawler.list_repos().inspect_err(|err| {
            warn!(error = %err, "repo listing failed");
        })?;
        self.store.upsert_repos(&mut repos)?;
        self.store.finish_reindex_all((self.clock)())?;
        info!(repos = repos.len(), "repo list refreshed");
        Ok(repos.len())
    }

    fn reindex_repo(&mut self, work: &RepoReindexWork) -> Result<(), WorkerError> {
        let crawl = self.crawler.crawl_repo(work).inspect_err(|err| {
            warn!(repo = %work.name, error = %err, "repo crawl failed");
        })?;
        ensure_owned_by(&crawl, work)?;

        // PRs first: commits may reference them.
        self.store.upsert_prs_with_reviewers(&crawl.prs)?;
        self.store.upsert_commits(&crawl.commits)?;
        self.store.finish_repo_reindex(work.repo_id, (self.clock)())?;
        info!(
            repo = %work.name,
            prs = crawl.prs.len(),
            commits = crawl.commits.len(),
            "repo re-indexed"
        );
        Ok(())
    }

    /// Polls until `stop` is set. Errors are logged and retried on the next poll.
    pub fn run(&mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            match self.tick() {
                Ok(outcome) if !outcome.is_idle() => continue,
                Ok(_) => {}
                Err(err) => warn!(error = %err, "poll failed"),
            }
            sleep(self.config.poll);
        }
    }
}

fn ensure_owned_by(crawl: &RepoCrawl, work: &RepoReindexWork) -> Result<(), CrawlError> {
    let foreign_pr = crawl.prs.iter().any(|pr| pr.repo_id != work.repo_id);
    let foreign_commit = crawl.commits.iter().any(|c| {
        c.repo_id != work.repo_id
            || c.associated_pr.is_some_and(|pr| pr.repo_id != work.repo_id)
    });
    if foreign_pr || foreign_commit {
        return Err(CrawlError::Invalid(format!(
            "crawl of {} returned records of another repo",
            work.name
        )));
    }
    Ok(())
}
