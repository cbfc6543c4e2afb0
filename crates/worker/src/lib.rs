#![forbid(unsafe_code)]

mod config;
mod crawler;
mod snapshot;
mod worker;

pub use config::{Args, ConfigError, WorkerConfig};
pub use crawler::{CrawlError, Crawler, RepoCrawl};
pub use snapshot::SnapshotCrawler;
pub use worker::{TickOutcome, Worker, WorkerError};

#[cfg(test)]
mod tests;
