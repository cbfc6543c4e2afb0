#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS repo_commits (
          commit_sha TEXT PRIMARY KEY,
          repo_id INTEGER NOT NULL,
          committed_at_ms INTEGER NOT NULL,
          author_email TEXT NOT NULL,
          associated_pr_repo_id INTEGER,
          associated_pr_number INTEGER,
          FOREIGN KEY (repo_id) REFERENCES repos(repo_id) ON DELETE CASCADE,
          FOREIGN KEY (associated_pr_repo_id, associated_pr_number)
            REFERENCES repo_prs(repo_id, pr_number)
            ON DELETE SET NULL,
          CHECK ((associated_pr_repo_id IS NULL) = (associated_pr_number IS NULL))
        );
"#;
