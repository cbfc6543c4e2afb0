#![forbid(unsafe_code)]

use super::error::at;
use super::support::{rows_per_statement, to_sqlite_i64, values_placeholders};
use super::*;
use crd_core::{RepoId, RepoPr, RepoPrReviewerStats};
use rusqlite::types::Value;
use rusqlite::{Transaction, params, params_from_iter};
use std::collections::BTreeSet;
use tracing::info;

const PR_FIELDS: usize = 4;
const REVIEWER_FIELDS: usize = 5;

fn upsert_prs_sql(rows: usize) -> String {
    format!(
        "INSERT INTO repo_prs(repo_id, pr_number, created_at_ms, merged_at_ms)
VALUES {}
ON CONFLICT(repo_id, pr_number) DO UPDATE SET
  created_at_ms = excluded.created_at_ms,
  merged_at_ms = excluded.merged_at_ms",
        values_placeholders(rows, PR_FIELDS)
    )
}

fn insert_reviewers_sql(rows: usize) -> String {
    format!(
        "INSERT INTO pr_reviewers(repo_id, pr_number, reviewer_email, num_comments, approved)
VALUES {}",
        values_placeholders(rows, REVIEWER_FIELDS)
    )
}

impl SqliteStore {
    /// Upserts PRs and replaces each PR's reviewer set wholesale, in one
    /// transaction. An empty list is a no-op.
    pub fn upsert_prs_with_reviewers(&mut self, prs: &[RepoPr]) -> Result<(), StoreError> {
        if prs.is_empty() {
            return Ok(());
        }
        validate_pr_batch(prs)?;

        let tx = self
            .conn
            .transaction()
            .map_err(at(WriteStep::BeginTransaction))?;
        upsert_prs_tx(&tx, prs).map_err(at(WriteStep::UpsertPrs))?;
        delete_reviewers_tx(&tx, prs).map_err(at(WriteStep::DeleteReviewers))?;
        let total_reviewers =
            insert_reviewers_tx(&tx, prs).map_err(at(WriteStep::InsertReviewers))?;
        tx.commit().map_err(at(WriteStep::Commit))?;

        info!(
            prs = prs.len(),
            reviewers = total_reviewers,
            "stored prs with reviewers"
        );
        Ok(())
    }

    /// Removes a PR. Its reviewers go with it; commits pointing at it keep
    /// existing with their PR association cleared.
    pub fn delete_pr(&mut self, repo_id: RepoId, number: i64) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM repo_prs WHERE repo_id=?1 AND pr_number=?2",
            params![repo_id.get(), number],
        )?;
        Ok(deleted > 0)
    }

    pub fn list_prs(&self, request: &ListPrsRequest) -> Result<Vec<RepoPr>, StoreError> {
        let mut clauses = vec!["repo_id = ?"];
        let mut values = vec![Value::Integer(request.repo_id.get())];
        if let Some(since_ms) = request.created_since_ms {
            clauses.push("created_at_ms >= ?");
            values.push(Value::Integer(since_ms));
        }
        if let Some(until_ms) = request.created_until_ms {
            clauses.push("created_at_ms < ?");
            values.push(Value::Integer(until_ms));
        }
        values.push(Value::Integer(to_sqlite_i64(request.limit)));
        values.push(Value::Integer(to_sqlite_i64(request.offset)));

        let sql = format!(
            "SELECT repo_id, pr_number, created_at_ms, merged_at_ms FROM repo_prs \
             WHERE {} \
             ORDER BY created_at_ms ASC, pr_number ASC \
             LIMIT ? OFFSET ?",
            clauses.join(" AND ")
        );

        let mut prs = Vec::new();
        {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(values))?;
            while let Some(row) = rows.next()? {
                prs.push(RepoPr {
                    repo_id: RepoId::new(row.get(0)?),
                    number: row.get(1)?,
                    created_at_ms: row.get(2)?,
                    merged_at_ms: row.get(3)?,
                    reviewers: Vec::new(),
                });
            }
        }

        let mut stmt = self.conn.prepare_cached(
            "SELECT reviewer_email, num_comments, approved FROM pr_reviewers \
             WHERE repo_id=?1 AND pr_number=?2 \
             ORDER BY reviewer_email ASC",
        )?;
        for pr in &mut prs {
            let mut rows = stmt.query(params![pr.repo_id.get(), pr.number])?;
            while let Some(row) = rows.next()? {
                pr.reviewers.push(RepoPrReviewerStats {
                    reviewer_email: row.get(0)?,
                    num_comments: row.get(1)?,
                    approved: row.get(2)?,
                });
            }
        }

        Ok(prs)
    }

    pub fn list_reviews_by_reviewer(
        &self,
        request: &ListReviewsRequest,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT r.repo_id, r.pr_number, r.reviewer_email, r.num_comments, r.approved, p.created_at_ms, p.merged_at_ms \
             FROM pr_reviewers r \
             JOIN repo_prs p ON p.repo_id = r.repo_id AND p.pr_number = r.pr_number \
             WHERE r.reviewer_email = ?1 \
             ORDER BY p.created_at_ms ASC, r.repo_id ASC, r.pr_number ASC \
             LIMIT ?2 OFFSET ?3",
        )?;
        let mut rows = stmt.query(params![
            request.reviewer_email,
            to_sqlite_i64(request.limit),
            to_sqlite_i64(request.offset)
        ])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(ReviewRecord {
                repo_id: RepoId::new(row.get(0)?),
                pr_number: row.get(1)?,
                reviewer_email: row.get(2)?,
                num_comments: row.get(3)?,
                approved: row.get(4)?,
                pr_created_at_ms: row.get(5)?,
                pr_merged_at_ms: row.get(6)?,
            });
        }
        Ok(out)
    }
}

fn validate_pr_batch(prs: &[RepoPr]) -> Result<(), StoreError> {
    let mut seen_prs = BTreeSet::new();
    for pr in prs {
        if pr.number <= 0 {
            return Err(StoreError::InvalidInput("pr number must be positive"));
        }
        if !seen_prs.insert(pr.pr_ref()) {
            return Err(StoreError::InvalidInput(
                "duplicate (repo_id, number) in pr batch",
            ));
        }
        let mut seen_reviewers = BTreeSet::new();
        for reviewer in &pr.reviewers {
            if reviewer.reviewer_email.trim().is_empty() {
                return Err(StoreError::InvalidInput(
                    "reviewer_email must not be empty",
                ));
            }
            if !seen_reviewers.insert(reviewer.reviewer_email.as_str()) {
                return Err(StoreError::InvalidInput("duplicate reviewer within a pr"));
            }
        }
    }
    Ok(())
}

fn upsert_prs_tx(tx: &Transaction<'_>, prs: &[RepoPr]) -> rusqlite::Result<()> {
    for chunk in prs.chunks(rows_per_statement(PR_FIELDS)) {
        let mut values = Vec::with_capacity(chunk.len() * PR_FIELDS);
        for pr in chunk {
            values.push(Value::Integer(pr.repo_id.get()));
            values.push(Value::Integer(pr.number));
            values.push(Value::Integer(pr.created_at_ms));
            values.push(pr.merged_at_ms.map_or(Value::Null, Value::Integer));
        }
        tx.execute(&upsert_prs_sql(chunk.len()), params_from_iter(values))?;
    }
    Ok(())
}

fn delete_reviewers_tx(tx: &Transaction<'_>, prs: &[RepoPr]) -> rusqlite::Result<()> {
    let mut stmt =
        tx.prepare_cached("DELETE FROM pr_reviewers WHERE repo_id=?1 AND pr_number=?2")?;
    for pr in prs {
        stmt.execute(params![pr.repo_id.get(), pr.number])?;
    }
    Ok(())
}

fn insert_reviewers_tx(tx: &Transaction<'_>, prs: &[RepoPr]) -> rusqlite::Result<usize> {
    let reviewers: Vec<(&RepoPr, &RepoPrReviewerStats)> = prs
        .iter()
        .flat_map(|pr| pr.reviewers.iter().map(move |reviewer| (pr, reviewer)))
        .collect();
    if reviewers.is_empty() {
        return Ok(0);
    }

    for chunk in reviewers.chunks(rows_per_statement(REVIEWER_FIELDS)) {
        let mut values = Vec::with_capacity(chunk.len() * REVIEWER_FIELDS);
        for (pr, reviewer) in chunk {
            values.push(Value::Integer(pr.repo_id.get()));
            values.push(Value::Integer(pr.number));
            values.push(Value::Text(reviewer.reviewer_email.clone()));
            values.push(Value::Integer(i64::from(reviewer.num_comments)));
            values.push(Value::Integer(i64::from(reviewer.approved)));
        }
        tx.execute(&insert_reviewers_sql(chunk.len()), params_from_iter(values))?;
    }
    Ok(reviewers.len())
}
