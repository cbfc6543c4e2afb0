#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        -- AUTOINCREMENT: a repo_id is never handed out twice, even after deletes.
        CREATE TABLE IF NOT EXISTS repos (
          repo_id INTEGER PRIMARY KEY AUTOINCREMENT,
          org_repo_name TEXT NOT NULL UNIQUE,
          default_branch_name TEXT NOT NULL,
          indexing_began_ms INTEGER NOT NULL,
          indexing_finished_ms INTEGER NOT NULL
        );
"#;
