#![forbid(unsafe_code)]

mod schema;
mod sql_builder;
mod time;

pub(super) use schema::{install_schema, preflight_gate};
pub(super) use sql_builder::*;
pub use time::now_ms;
pub(super) use time::duration_to_ms;
