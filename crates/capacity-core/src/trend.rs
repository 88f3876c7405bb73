//! Capacity usage and trend classification for observed per-pod rates
//!
//! The previous-value store for trend detection is an explicit map owned
//! by the caller and threaded through each report cycle, so two monitors
//! never share state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Relative change below this fraction counts as steady
pub const TREND_STABILITY_BAND: f64 = 0.05;

/// Load classification for one pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadLevel {
    Healthy,
    Medium,
    High,
    Overload,
    /// Error rate above 1%, regardless of capacity usage
    Critical,
}

impl std::fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoadLevel::Healthy => "HEALTHY",
            LoadLevel::Medium => "MEDIUM",
            LoadLevel::High => "HIGH",
            LoadLevel::Overload => "OVERLOAD",
            LoadLevel::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

/// Direction of change between two report cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Steady,
    Rising,
    Falling,
}

/// Capacity usage as a percentage of the theoretical per-pod maximum
///
/// Returns 0 when the theoretical capacity is not positive, since a
/// percentage of nothing is meaningless rather than infinite.
pub fn capacity_usage(current_rps: f64, theoretical_rps: f64) -> f64 {
    if theoretical_rps <= 0.0 {
        return 0.0;
    }
    current_rps / theoretical_rps * 100.0
}

/// Classify a pod's load from capacity usage and error rate
pub fn load_level(capacity_pct: f64, error_rate_pct: f64) -> LoadLevel {
    if error_rate_pct > 1.0 {
        LoadLevel::Critical
    } else if capacity_pct > 90.0 {
        LoadLevel::Overload
    } else if capacity_pct > 80.0 {
        LoadLevel::High
    } else if capacity_pct > 60.0 {
        LoadLevel::Medium
    } else {
        LoadLevel::Healthy
    }
}

/// Compare the current rate to the last observed value for this subject
///
/// The first observation for a subject is always [`Trend::Steady`]. The
/// map is updated in place so the caller can carry it into the next cycle.
pub fn rps_trend(previous: &mut HashMap<String, f64>, subject: &str, current_rps: f64) -> Trend {
    let trend = match previous.get(subject) {
        None => Trend::Steady,
        Some(&last) => {
            let diff = current_rps - last;
            if diff.abs() < current_rps.abs() * TREND_STABILITY_BAND {
                Trend::Steady
            } else if diff > 0.0 {
                Trend::Rising
            } else {
                Trend::Falling
            }
        }
    };
    previous.insert(subject.to_string(), current_rps);
    trend
}
