use super::*;
use clap::Parser;
use crd_core::{
    CommitSha, IndexingCursor, OrgRepoName, PrRef, Repo, RepoCommit, RepoId, RepoPr,
    RepoPrReviewerStats, RepoReindexWork,
};
use crd_storage::{ListCommitsRequest, ListPrsRequest, SqliteStore, StoreError, StoreOptions};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tempfile::TempDir;

const NOW_MS: i64 = 1_700_000_000_000;
const TTL: Duration = Duration::from_secs(60);
const PERIOD: Duration = Duration::from_secs(60 * 60);

#[derive(Default)]
struct FakeCrawler {
    repos: Vec<&'static str>,
    fail_repos: Vec<&'static str>,
    commits_per_repo: HashMap<&'static str, usize>,
    foreign_repo_id: Option<RepoId>,
    stop_after_crawl: Option<Arc<AtomicBool>>,
    crawled: Vec<String>,
}

impl Crawler for FakeCrawler {
    fn list_repos(&mut self) -> Result<Vec<Repo>, CrawlError> {
        Ok(self
            .repos
            .iter()
            .map(|name| Repo::new(OrgRepoName::try_new(*name).expect("repo name"), "main"))
            .collect())
    }

    fn crawl_repo(&mut self, work: &RepoReindexWork) -> Result<RepoCrawl, CrawlError> {
        self.crawled.push(work.name.to_string());
        if let Some(stop) = &self.stop_after_crawl {
            stop.store(true, Ordering::SeqCst);
        }
        if self.fail_repos.iter().any(|name| *name == work.name.as_str()) {
            return Err(CrawlError::Invalid("rate limited".to_string()));
        }
        let repo_id = self.foreign_repo_id.unwrap_or(work.repo_id);
        let pr = RepoPr {
            repo_id,
            number: 1,
            created_at_ms: NOW_MS - 10_000,
            merged_at_ms: None,
            reviewers: vec![RepoPrReviewerStats {
                reviewer_email: "rev@corp.dev".to_string(),
                num_comments: 2,
                approved: true,
            }],
        };
        let count = self
            .commits_per_repo
            .get(work.name.as_str())
            .copied()
            .unwrap_or(1);
        let commits = (0..count)
            .map(|i| RepoCommit {
                sha: CommitSha::try_new(format!("{:04x}{:08x}", repo_id.get(), i))
                    .expect("sha"),
                repo_id,
                committed_at_ms: NOW_MS - 5_000 + i as i64,
                author_email: "dev@corp.dev".to_string(),
                associated_pr: Some(PrRef { repo_id, number: 1 }),
            })
            .collect();
        Ok(RepoCrawl {
            prs: vec![pr],
            commits,
        })
    }
}

fn config() -> WorkerConfig {
    WorkerConfig {
        reindex_ttl: TTL,
        reindex_period: PERIOD,
        poll: Duration::from_millis(10),
        store: StoreOptions::default(),
    }
}

fn worker(crawler: FakeCrawler) -> (TempDir, Arc<AtomicI64>, Worker<FakeCrawler>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    let now = Arc::new(AtomicI64::new(NOW_MS));
    let clock = Arc::clone(&now);
    let worker =
        Worker::new(store, crawler, config()).with_clock(move || clock.load(Ordering::SeqCst));
    (dir, now, worker)
}

fn name(value: &str) -> OrgRepoName {
    OrgRepoName::try_new(value).expect("repo name")
}

fn commits_of(worker: &Worker<FakeCrawler>, repo_id: RepoId) -> usize {
    worker
        .store()
        .list_commits(&ListCommitsRequest {
            repo_id: Some(repo_id),
            author_email: None,
            since_ms: None,
            until_ms: None,
            limit: 1_000,
            offset: 0,
        })
        .expect("list commits")
        .len()
}

#[test]
fn first_tick_lists_repos_and_indexes_the_first_one() {
    let (_dir, _now, mut worker) = worker(FakeCrawler {
        repos: vec!["corp/api", "corp/web"],
        ..FakeCrawler::default()
    });

    let outcome = worker.tick().expect("tick");
    assert!(outcome.reindexed_all);
    assert_eq!(outcome.repos_listed, 2);
    assert_eq!(outcome.repo, Some(name("corp/api")));

    let cursor = worker.store().reindex_all_cursor().expect("cursor");
    assert_eq!(
        cursor,
        IndexingCursor {
            indexing_began_ms: NOW_MS,
            indexing_finished_ms: NOW_MS,
        }
    );

    let api = worker
        .store()
        .repo_by_name(&name("corp/api"))
        .expect("lookup")
        .and_then(|repo| repo.repo_id)
        .expect("api stored");
    assert_eq!(commits_of(&worker, api), 1);
    let prs = worker
        .store()
        .list_prs(&ListPrsRequest {
            repo_id: api,
            created_since_ms: None,
            created_until_ms: None,
            limit: 10,
            offset: 0,
        })
        .expect("list prs");
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].reviewers.len(), 1);
    assert_eq!(
        worker
            .store()
            .repo_indexing_cursor(api)
            .expect("repo cursor")
            .map(|c| c.indexing_finished_ms),
        Some(NOW_MS)
    );
}

#[test]
fn queue_drains_then_goes_idle_until_the_period_elapses() {
    let (_dir, now, mut worker) = worker(FakeCrawler {
        repos: vec!["corp/api", "corp/web"],
        ..FakeCrawler::default()
    });

    assert_eq!(worker.tick().expect("tick 1").repo, Some(name("corp/api")));
    let second = worker.tick().expect("tick 2");
    assert!(!second.reindexed_all);
    assert_eq!(second.repo, Some(name("corp/web")));
    assert!(worker.tick().expect("tick 3").is_idle());

    now.fetch_add(PERIOD.as_millis() as i64, Ordering::SeqCst);
    let again = worker.tick().expect("tick after period");
    assert!(again.reindexed_all);
    assert_eq!(again.repo, Some(name("corp/api")));
    assert_eq!(
        worker.crawler_mut().crawled,
        vec!["corp/api", "corp/web", "corp/api"]
    );
}

#[test]
fn run_returns_once_the_stop_flag_is_raised() {
    let stop = Arc::new(AtomicBool::new(false));
    let (_dir, _now, mut worker) = worker(FakeCrawler {
        repos: vec!["corp/api", "corp/web"],
        stop_after_crawl: Some(Arc::clone(&stop)),
        ..FakeCrawler::default()
    });

    worker.run(&stop);
    assert_eq!(worker.crawler_mut().crawled, vec!["corp/api"]);
}

#[test]
fn failed_crawl_leaves_repo_claimed_until_ttl_expires() {
    let (_dir, now, mut worker) = worker(FakeCrawler {
        repos: vec!["corp/api"],
        fail_repos: vec!["corp/api"],
        ..FakeCrawler::default()
    });

    let err = worker.tick().expect_err("crawl fails");
    assert!(matches!(err, WorkerError::Crawl(_)));

    let api = worker
        .store()
        .repo_by_name(&name("corp/api"))
        .expect("lookup")
        .and_then(|repo| repo.repo_id)
        .expect("api stored");
    assert_eq!(
        worker.store().repo_indexing_cursor(api).expect("cursor"),
        Some(IndexingCursor {
            indexing_began_ms: NOW_MS,
            indexing_finished_ms: 0,
        })
    );
    assert_eq!(commits_of(&worker, api), 0);

    // Lease still live.
    assert!(worker.tick().expect("tick within ttl").is_idle());

    worker.crawler_mut().fail_repos.clear();
    now.fetch_add(TTL.as_millis() as i64, Ordering::SeqCst);
    let outcome = worker.tick().expect("takeover");
    assert_eq!(outcome.repo, Some(name("corp/api")));
    assert_eq!(commits_of(&worker, api), 1);
}

#[test]
fn empty_listing_leaves_reindex_all_unfinished() {
    let (_dir, _now, mut worker) = worker(FakeCrawler::default());

    let err = worker.tick().expect_err("empty listing");
    assert!(matches!(
        err,
        WorkerError::Store(StoreError::InvalidInput(_))
    ));
    assert_eq!(
        worker.store().reindex_all_cursor().expect("cursor"),
        IndexingCursor {
            indexing_began_ms: NOW_MS,
            indexing_finished_ms: 0,
        }
    );
}

#[test]
fn crawl_returning_another_repo_is_rejected() {
    let (_dir, _now, mut worker) = worker(FakeCrawler {
        repos: vec!["corp/api"],
        foreign_repo_id: Some(RepoId::new(999)),
        ..FakeCrawler::default()
    });

    let err = worker.tick().expect_err("foreign records");
    assert!(matches!(err, WorkerError::Crawl(CrawlError::Invalid(_))));
    assert_eq!(commits_of(&worker, RepoId::new(999)), 0);
}

#[test]
fn large_crawl_is_ingested_in_one_pass() {
    let mut commits_per_repo = HashMap::new();
    commits_per_repo.insert("corp/api", 700);
    let (_dir, _now, mut worker) = worker(FakeCrawler {
        repos: vec!["corp/api"],
        commits_per_repo,
        ..FakeCrawler::default()
    });

    worker.tick().expect("tick");
    let api = worker
        .store()
        .repo_by_name(&name("corp/api"))
        .expect("lookup")
        .and_then(|repo| repo.repo_id)
        .expect("api stored");
    assert_eq!(commits_of(&worker, api), 700);
}

fn parse(extra: &[&str]) -> Result<WorkerConfig, ConfigError> {
    let mut argv = vec![
        "crd-worker",
        "--storage-dir",
        "/tmp/crd",
        "--snapshot-dir",
        "/tmp/crd-snapshot",
    ];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv)
        .expect("parse args")
        .worker_config()
}

#[test]
fn config_requires_positive_durations() {
    let config = parse(&["--reindex-ttl-s", "30", "--reindex-period-s", "3600"]).expect("valid");
    assert_eq!(config.reindex_ttl, Duration::from_secs(30));
    assert_eq!(config.reindex_period, Duration::from_secs(3600));
    assert_eq!(config.poll, Duration::from_millis(1_000));
    assert_eq!(config.store.busy_timeout, Duration::from_millis(5_000));

    assert_eq!(
        parse(&["--reindex-ttl-s", "0", "--reindex-period-s", "3600"]),
        Err(ConfigError::ZeroTtl)
    );
    assert_eq!(
        parse(&["--reindex-ttl-s", "30", "--reindex-period-s", "0"]),
        Err(ConfigError::ZeroPeriod)
    );
    assert_eq!(
        parse(&[
            "--reindex-ttl-s",
            "30",
            "--reindex-period-s",
            "60",
            "--poll-ms",
            "0"
        ]),
        Err(ConfigError::ZeroPoll)
    );
}

fn write_snapshot(dir: &std::path::Path) {
    std::fs::create_dir_all(dir.join("repos")).expect("mkdir");
    std::fs::write(
        dir.join("repos.json"),
        r#"[
            {"org_repo_name": "corp/api", "default_branch_name": "main"},
            {"org_repo_name": "corp/web", "default_branch_name": "trunk"}
        ]"#,
    )
    .expect("write repos.json");
    std::fs::write(
        dir.join("repos").join("corp__api.json"),
        r#"{
            "prs": [{
                "number": 12,
                "created": "2024-01-01T00:00:00Z",
                "merged": "2024-01-02T00:00:00Z",
                "reviewers": [{"reviewer_email": "rev@corp.dev", "num_comments": 3, "approved": true}]
            }],
            "commits": [
                {"sha": "ABCDEF12", "committed": "2024-01-01T12:00:00Z", "author_email": "dev@corp.dev", "pr_number": 12},
                {"sha": "0123abcd", "committed": "2024-01-03T00:00:00Z", "author_email": "dev@corp.dev"}
            ]
        }"#,
    )
    .expect("write repo snapshot");
}

#[test]
fn snapshot_crawler_reads_exported_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_snapshot(dir.path());
    let mut crawler = SnapshotCrawler::new(dir.path());

    let repos = crawler.list_repos().expect("list repos");
    assert_eq!(repos.len(), 2);
    assert_eq!(repos[1].default_branch_name, "trunk");

    let work = RepoReindexWork {
        repo_id: RepoId::new(7),
        name: name("corp/api"),
        default_branch_name: "main".to_string(),
    };
    let crawl = crawler.crawl_repo(&work).expect("crawl");
    assert_eq!(crawl.prs.len(), 1);
    assert_eq!(crawl.prs[0].created_at_ms, 1_704_067_200_000);
    assert_eq!(crawl.prs[0].merged_at_ms, Some(1_704_153_600_000));
    assert_eq!(crawl.prs[0].reviewers[0].num_comments, 3);
    assert_eq!(crawl.commits.len(), 2);
    assert_eq!(crawl.commits[0].sha.as_str(), "abcdef12");
    assert_eq!(
        crawl.commits[0].associated_pr,
        Some(PrRef {
            repo_id: RepoId::new(7),
            number: 12
        })
    );
    assert_eq!(crawl.commits[1].associated_pr, None);

    let missing = RepoReindexWork {
        repo_id: RepoId::new(8),
        name: name("corp/web"),
        default_branch_name: "trunk".to_string(),
    };
    assert_eq!(crawler.crawl_repo(&missing).expect("crawl"), RepoCrawl::default());
}

#[test]
fn snapshot_crawler_reports_malformed_json() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("repos.json"), "{not json").expect("write");
    let err = SnapshotCrawler::new(dir.path())
        .list_repos()
        .expect_err("decode error");
    assert!(matches!(err, CrawlError::Decode { .. }));
}

#[test]
fn worker_ingests_snapshot_end_to_end() {
    let snapshot = tempfile::tempdir().expect("snapshot dir");
    write_snapshot(snapshot.path());
    let storage = tempfile::tempdir().expect("storage dir");
    let store = SqliteStore::open(storage.path()).expect("open store");
    let mut worker = Worker::new(store, SnapshotCrawler::new(snapshot.path()), config())
        .with_clock(|| NOW_MS);

    assert_eq!(worker.tick().expect("tick 1").repo, Some(name("corp/api")));
    assert_eq!(worker.tick().expect("tick 2").repo, Some(name("corp/web")));
    assert!(worker.tick().expect("tick 3").is_idle());

    let reviews = worker
        .store()
        .list_reviews_by_reviewer(&crd_storage::ListReviewsRequest {
            reviewer_email: "rev@corp.dev".to_string(),
            limit: 10,
            offset: 0,
        })
        .expect("reviews");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].pr_number, 12);
    assert!(reviews[0].approved);
}
