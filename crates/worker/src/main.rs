#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use crd_storage::SqliteStore;
use crd_worker::{Args, SnapshotCrawler, Worker};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.worker_config()?;
    let store = SqliteStore::open_with(&args.storage_dir, config.store)
        .with_context(|| format!("open store at {}", args.storage_dir.display()))?;
    let crawler = SnapshotCrawler::new(&args.snapshot_dir);
    let mut worker = Worker::new(store, crawler, config);

    if args.once {
        let outcome = worker.tick()?;
        tracing::info!(?outcome, "single poll done");
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&stop))
            .with_context(|| format!("register handler for signal {signal}"))?;
    }
    worker.run(&stop);
    tracing::info!("stop signal received, worker exiting");
    Ok(())
}
