#![forbid(unsafe_code)]

use super::*;
use crd_core::{IndexingCursor, OrgRepoName, RepoId, RepoReindexWork};
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tracing::debug;

// Eligibility is evaluated inside the UPDATE itself: a claim succeeds iff the
// predicate held and this statement was the one that changed the row.
const CLAIM_REINDEX_ALL_SQL: &str = "\
UPDATE reindex_all_cursor
SET indexing_began_ms = ?3
WHERE singleton = 1
  AND indexing_began_ms + ?1 <= ?3
  AND indexing_finished_ms + ?2 <= ?3";

const CLAIM_REPO_SQL: &str = "\
UPDATE repos
SET indexing_began_ms = ?3
WHERE repo_id = (
    SELECT repo_id
    FROM repos
    WHERE indexing_began_ms + ?1 <= ?3
      AND indexing_finished_ms + ?2 <= ?3
    ORDER BY indexing_finished_ms ASC, repo_id ASC
    LIMIT 1
)
RETURNING repo_id, org_repo_name, default_branch_name";

impl SqliteStore {
    /// Claims the global "re-index every repo" trigger. `false` means not due yet
    /// or another worker holds a live lease.
    pub fn try_claim_reindex_all(
        &mut self,
        request: &ReindexClaimRequest,
    ) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            CLAIM_REINDEX_ALL_SQL,
            params![request.ttl_ms(), request.period_ms(), request.now_ms],
        )?;
        let claimed = changed > 0;
        debug!(claimed, now_ms = request.now_ms, "reindex-all claim attempt");
        Ok(claimed)
    }

    /// Claims the due repo whose last completed index is the oldest.
    ///
    /// A claimed row whose name fails to decode is rolled back and reported as
    /// `CORRUPT_ROW`; its cursor is left untouched.
    pub fn try_claim_repo(
        &mut self,
        request: &ReindexClaimRequest,
    ) -> Result<Option<RepoReindexWork>, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = tx
            .query_row(
                CLAIM_REPO_SQL,
                params![request.ttl_ms(), request.period_ms(), request.now_ms],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((repo_id, name, default_branch_name)) = row else {
            debug!(now_ms = request.now_ms, "no repo due for re-index");
            return Ok(None);
        };

        let name = OrgRepoName::try_new(name)
            .map_err(|_| StoreError::CorruptRow("invalid org_repo_name"))?;
        tx.commit()?;
        debug!(repo_id, repo = %name, "claimed repo for re-index");
        Ok(Some(RepoReindexWork {
            repo_id: RepoId::new(repo_id),
            name,
            default_branch_name,
        }))
    }

    pub fn finish_reindex_all(&mut self, now_ms: i64) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE reindex_all_cursor SET indexing_finished_ms=?1 WHERE singleton=1",
            params![now_ms],
        )?;
        debug!(now_ms, "reindex-all finished");
        Ok(())
    }

    pub fn finish_repo_reindex(&mut self, repo_id: RepoId, now_ms: i64) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE repos SET indexing_finished_ms=?2 WHERE repo_id=?1",
            params![repo_id.get(), now_ms],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownRepo { repo_id });
        }
        debug!(repo_id = repo_id.get(), now_ms, "repo re-index finished");
        Ok(())
    }

    pub fn reindex_all_cursor(&self) -> Result<IndexingCursor, StoreError> {
        Ok(self.conn.query_row(
            "SELECT indexing_began_ms, indexing_finished_ms FROM reindex_all_cursor WHERE singleton=1",
            [],
            |row| {
                Ok(IndexingCursor {
                    indexing_began_ms: row.get(0)?,
                    indexing_finished_ms: row.get(1)?,
                })
            },
        )?)
    }

    pub fn repo_indexing_cursor(
        &self,
        repo_id: RepoId,
    ) -> Result<Option<IndexingCursor>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT indexing_began_ms, indexing_finished_ms FROM repos WHERE repo_id=?1",
                params![repo_id.get()],
                |row| {
                    Ok(IndexingCursor {
                        indexing_began_ms: row.get(0)?,
                        indexing_finished_ms: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }
}
