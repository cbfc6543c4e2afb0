#![forbid(unsafe_code)]

mod claims;
mod commits;
mod error;
mod prs;
mod repos;
mod requests;
mod support;
mod types;

pub use error::{StoreError, WriteStep};
pub use requests::*;
pub use support::now_ms;
pub use types::*;

use rusqlite::{Connection, InterruptHandle};
use std::path::Path;
use std::time::Duration;
use support::{duration_to_ms, install_schema, preflight_gate};

pub const DB_FILE_NAME: &str = "codereviewdash.db";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long a statement waits on another writer's lock before failing.
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Handle on the indexing database. Every worker process opens its own; all
/// coordination between them happens inside SQLite.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(storage_dir, StoreOptions::default())
    }

    pub fn open_with(
        storage_dir: impl AsRef<Path>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref();
        std::fs::create_dir_all(storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(options.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;

        tracing::debug!(dir = %storage_dir.display(), "opened indexing store");
        Ok(Self { conn })
    }

    /// Lets a caller enforce its own deadline: interrupting aborts the in-flight
    /// statement and rolls back an open transaction.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }
}
