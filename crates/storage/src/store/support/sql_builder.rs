#![forbid(unsafe_code)]

/// Conservative bound-parameter budget per statement (SQLite's historical
/// `SQLITE_MAX_VARIABLE_NUMBER`).
pub(in crate::store) const MAX_BOUND_PARAMS: usize = 999;

pub(in crate::store) fn rows_per_statement(fields: usize) -> usize {
    (MAX_BOUND_PARAMS / fields).max(1)
}

/// `(?, ?, ?), (?, ?, ?)` for `rows` rows of `fields` columns.
pub(in crate::store) fn values_placeholders(rows: usize, fields: usize) -> String {
    let row = format!("({})", vec!["?"; fields].join(", "));
    vec![row; rows].join(",\n  ")
}

pub(in crate::store) fn to_sqlite_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
