//! Sizing and compliance models for OpenFGA on MariaDB Galera
//!
//! This crate holds the pure calculation core:
//! - Connection pool and resource sizing from a target request rate
//! - Threshold evaluation of declared workload and pool configuration
//! - Resource quantity string parsing
//! - Capacity usage and trend classification
//!
//! Everything here is a deterministic function over its arguments: no I/O,
//! no shared state, safe to call from any thread.

pub mod compliance;
pub mod models;
pub mod sizing;
pub mod trend;
pub mod units;

pub use models::*;
pub use sizing::SizingError;
pub use trend::{LoadLevel, Trend};
pub use units::{Quantity, UnitParseError};
