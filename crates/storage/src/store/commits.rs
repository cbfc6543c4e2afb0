#![forbid(unsafe_code)]

use super::error::at;
use super::support::{rows_per_statement, to_sqlite_i64, values_placeholders};
use super::*;
use crd_core::{CommitSha, PrRef, RepoCommit, RepoId};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::info;

const COMMIT_FIELDS: usize = 6;

fn upsert_commits_sql(rows: usize) -> String {
    format!(
        "INSERT INTO repo_commits(commit_sha, repo_id, committed_at_ms, author_email, associated_pr_repo_id, associated_pr_number)
VALUES {}
ON CONFLICT(commit_sha) DO UPDATE SET
  repo_id = excluded.repo_id,
  committed_at_ms = excluded.committed_at_ms,
  author_email = excluded.author_email,
  associated_pr_repo_id = excluded.associated_pr_repo_id,
  associated_pr_number = excluded.associated_pr_number",
        values_placeholders(rows, COMMIT_FIELDS)
    )
}

impl SqliteStore {
    /// Last-writer-wins upsert keyed on the commit sha. An empty list is a no-op.
    ///
    /// A commit's PR association must point at a stored PR; write PRs first.
    pub fn upsert_commits(&mut self, commits: &[RepoCommit]) -> Result<(), StoreError> {
        if commits.is_empty() {
            return Ok(());
        }
        if commits.iter().any(|c| c.author_email.trim().is_empty()) {
            return Err(StoreError::InvalidInput(
                "commit author_email must not be empty",
            ));
        }

        // Chunks share one transaction so the whole call stays all-or-nothing.
        let tx = self
            .conn
            .transaction()
            .map_err(at(WriteStep::BeginTransaction))?;
        for chunk in commits.chunks(rows_per_statement(COMMIT_FIELDS)) {
            let mut values = Vec::with_capacity(chunk.len() * COMMIT_FIELDS);
            for commit in chunk {
                let (pr_repo_id, pr_number) = match commit.associated_pr {
                    Some(pr) => (Value::Integer(pr.repo_id.get()), Value::Integer(pr.number)),
                    None => (Value::Null, Value::Null),
                };
                values.push(Value::Text(commit.sha.as_str().to_string()));
                values.push(Value::Integer(commit.repo_id.get()));
                values.push(Value::Integer(commit.committed_at_ms));
                values.push(Value::Text(commit.author_email.clone()));
                values.push(pr_repo_id);
                values.push(pr_number);
            }
            tx.execute(&upsert_commits_sql(chunk.len()), params_from_iter(values))
                .map_err(at(WriteStep::UpsertCommits))?;
        }
        tx.commit().map_err(at(WriteStep::Commit))?;

        info!(commits = commits.len(), "stored commits");
        Ok(())
    }

    pub fn list_commits(
        &self,
        request: &ListCommitsRequest,
    ) -> Result<Vec<RepoCommit>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(repo_id) = request.repo_id {
            clauses.push("repo_id = ?");
            values.push(Value::Integer(repo_id.get()));
        }
        if let Some(author_email) = request.author_email.as_deref() {
            clauses.push("author_email = ?");
            values.push(Value::Text(author_email.to_string()));
        }
        if let Some(since_ms) = request.since_ms {
            clauses.push("committed_at_ms >= ?");
            values.push(Value::Integer(since_ms));
        }
        if let Some(until_ms) = request.until_ms {
            clauses.push("committed_at_ms < ?");
            values.push(Value::Integer(until_ms));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        values.push(Value::Integer(to_sqlite_i64(request.limit)));
        values.push(Value::Integer(to_sqlite_i64(request.offset)));

        let sql = format!(
            "SELECT commit_sha, repo_id, committed_at_ms, author_email, associated_pr_repo_id, associated_pr_number \
             FROM repo_commits {where_sql} \
             ORDER BY committed_at_ms ASC, commit_sha ASC \
             LIMIT ? OFFSET ?"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let sha = CommitSha::try_new(row.get::<_, String>(0)?)
                .map_err(|_| StoreError::CorruptRow("invalid commit_sha"))?;
            let pr_repo_id = row.get::<_, Option<i64>>(4)?;
            let pr_number = row.get::<_, Option<i64>>(5)?;
            let associated_pr = match (pr_repo_id, pr_number) {
                (Some(repo_id), Some(number)) => Some(PrRef {
                    repo_id: RepoId::new(repo_id),
                    number,
                }),
                _ => None,
            };
            out.push(RepoCommit {
                sha,
                repo_id: RepoId::new(row.get(1)?),
                committed_at_ms: row.get(2)?,
                author_email: row.get(3)?,
                associated_pr,
            });
        }
        Ok(out)
    }
}
