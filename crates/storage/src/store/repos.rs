#![forbid(unsafe_code)]

use super::error::at;
use super::*;
use crd_core::{NEVER_INDEXED_MS, OrgRepoName, Repo, RepoId};
use rusqlite::{OptionalExtension, Row, params};
use tracing::info;

// The cursor columns are only written on first insert; a conflict refreshes the
// branch name and nothing else.
const UPSERT_REPO_SQL: &str = "\
INSERT INTO repos(org_repo_name, default_branch_name, indexing_began_ms, indexing_finished_ms)
VALUES (?1, ?2, ?3, ?3)
ON CONFLICT(org_repo_name) DO UPDATE SET default_branch_name = excluded.default_branch_name
RETURNING repo_id";

impl SqliteStore {
    /// Stores the given repos and writes the assigned `repo_id` back into each
    /// record. Rejects an empty list: the crawler never legitimately lists zero repos.
    pub fn upsert_repos(&mut self, repos: &mut [Repo]) -> Result<(), StoreError> {
        if repos.is_empty() {
            return Err(StoreError::InvalidInput(
                "upsert_repos requires at least one repo",
            ));
        }

        let tx = self
            .conn
            .transaction()
            .map_err(at(WriteStep::BeginTransaction))?;
        let mut assigned = Vec::with_capacity(repos.len());
        {
            let mut stmt = tx
                .prepare_cached(UPSERT_REPO_SQL)
                .map_err(at(WriteStep::UpsertRepos))?;
            for repo in repos.iter() {
                let repo_id = stmt
                    .query_row(
                        params![
                            repo.name.as_str(),
                            repo.default_branch_name,
                            NEVER_INDEXED_MS
                        ],
                        |row| row.get::<_, i64>(0),
                    )
                    .map_err(at(WriteStep::UpsertRepos))?;
                assigned.push(RepoId::new(repo_id));
            }
        }
        tx.commit().map_err(at(WriteStep::Commit))?;

        for (repo, repo_id) in repos.iter_mut().zip(assigned) {
            repo.repo_id = Some(repo_id);
        }

        info!(repos = repos.len(), "stored repos");
        Ok(())
    }

    pub fn repo_by_name(&self, name: &OrgRepoName) -> Result<Option<Repo>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT repo_id, org_repo_name, default_branch_name FROM repos WHERE org_repo_name=?1",
                params![name.as_str()],
                repo_row,
            )
            .optional()?;

        row.map(into_repo).transpose()
    }

    pub fn list_repos(&self) -> Result<Vec<Repo>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT repo_id, org_repo_name, default_branch_name FROM repos ORDER BY repo_id ASC",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(into_repo(repo_row(row)?)?);
        }
        Ok(out)
    }
}

fn repo_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_repo(
    (repo_id, name, default_branch_name): (i64, String, String),
) -> Result<Repo, StoreError> {
    let name = OrgRepoName::try_new(name)
        .map_err(|_| StoreError::CorruptRow("invalid org_repo_name"))?;
    Ok(Repo {
        repo_id: Some(RepoId::new(repo_id)),
        name,
        default_branch_name,
    })
}
