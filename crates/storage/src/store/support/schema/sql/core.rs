#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        -- Work queue for the "re-index every repo" trigger: always exactly one row.
        CREATE TABLE IF NOT EXISTS reindex_all_cursor (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          indexing_began_ms INTEGER NOT NULL,
          indexing_finished_ms INTEGER NOT NULL
        );
"#;
