#![forbid(unsafe_code)]

use clap::Parser;
use crd_storage::StoreOptions;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "crd-worker",
    version,
    about = "Poll the indexing store for due work and ingest crawled GitHub data"
)]
pub struct Args {
    /// Directory holding the indexing database (shared by every worker).
    #[arg(long, env = "CRD_STORAGE_DIR")]
    pub storage_dir: PathBuf,

    /// Lease duration of a claim; an unfinished claim older than this is taken over.
    #[arg(long, env = "CRD_REINDEX_TTL_S")]
    pub reindex_ttl_s: u64,

    /// Minimum time between two completed re-indexes of the same resource.
    #[arg(long, env = "CRD_REINDEX_PERIOD_S")]
    pub reindex_period_s: u64,

    #[arg(long, default_value_t = 1_000)]
    pub poll_ms: u64,

    #[arg(long, default_value_t = 5_000)]
    pub busy_timeout_ms: u64,

    /// Directory with crawler output (`repos.json`, `repos/<org>__<name>.json`).
    #[arg(long, env = "CRD_SNAPSHOT_DIR")]
    pub snapshot_dir: PathBuf,

    /// Run a single poll and exit.
    #[arg(long)]
    pub once: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub reindex_ttl: Duration,
    pub reindex_period: Duration,
    pub poll: Duration,
    pub store: StoreOptions,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("--reindex-ttl-s must be greater than zero")]
    ZeroTtl,
    #[error("--reindex-period-s must be greater than zero")]
    ZeroPeriod,
    #[error("--poll-ms must be greater than zero")]
    ZeroPoll,
}

impl Args {
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        if self.reindex_ttl_s == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.reindex_period_s == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.poll_ms == 0 {
            return Err(ConfigError::ZeroPoll);
        }
        Ok(WorkerConfig {
            reindex_ttl: Duration::from_secs(self.reindex_ttl_s),
            reindex_period: Duration::from_secs(self.reindex_period_s),
            poll: Duration::from_millis(self.poll_ms),
            store: StoreOptions {
                busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            },
        })
    }
}
