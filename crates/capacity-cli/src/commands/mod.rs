//! CLI command implementations

pub mod check;
pub mod monitor;
pub mod plan;
pub mod status;
