#![forbid(unsafe_code)]

pub mod ids;
pub mod model;

pub use ids::*;
pub use model::*;
