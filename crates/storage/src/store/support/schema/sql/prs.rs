#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS repo_prs (
          repo_id INTEGER NOT NULL,
          pr_number INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          merged_at_ms INTEGER,
          PRIMARY KEY (repo_id, pr_number),
          FOREIGN KEY (repo_id) REFERENCES repos(repo_id) ON DELETE CASCADE,
          CHECK (pr_number > 0)
        );

        CREATE TABLE IF NOT EXISTS pr_reviewers (
          repo_id INTEGER NOT NULL,
          pr_number INTEGER NOT NULL,
          reviewer_email TEXT NOT NULL,
          num_comments INTEGER NOT NULL,
          approved INTEGER NOT NULL CHECK (approved IN (0, 1)),
          PRIMARY KEY (repo_id, pr_number, reviewer_email),
          FOREIGN KEY (repo_id, pr_number)
            REFERENCES repo_prs(repo_id, pr_number)
            ON DELETE CASCADE
        );
"#;
