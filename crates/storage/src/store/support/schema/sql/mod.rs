#![forbid(unsafe_code)]

mod commits;
mod core;
mod indexes;
mod pragmas;
mod prs;
mod repos;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(pragmas::SQL);
    sql.push_str(core::SQL);
    sql.push_str(repos::SQL);
    sql.push_str(prs::SQL);
    sql.push_str(commits::SQL);
    sql.push_str(indexes::SQL);
    sql
}
