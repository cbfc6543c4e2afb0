#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_repos_indexing_queue ON repos(indexing_finished_ms, repo_id);
        CREATE INDEX IF NOT EXISTS idx_repo_commits_repo_date ON repo_commits(repo_id, committed_at_ms);
        CREATE INDEX IF NOT EXISTS idx_repo_commits_author_date ON repo_commits(author_email, committed_at_ms);
        CREATE INDEX IF NOT EXISTS idx_repo_commits_pr ON repo_commits(associated_pr_repo_id, associated_pr_number);
        CREATE INDEX IF NOT EXISTS idx_repo_prs_created ON repo_prs(repo_id, created_at_ms);
        CREATE INDEX IF NOT EXISTS idx_pr_reviewers_email ON pr_reviewers(reviewer_email);
"#;
