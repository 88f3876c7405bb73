//! Connection pool and resource sizing for a target request rate
//!
//! Little's-Law-style arithmetic: concurrent in-flight work is the request
//! rate times per-request latency, padded by a safety factor. Every
//! rounding step rounds up so a recommendation never under-provisions.

use crate::models::{
    GaleraTopology, PoolSettings, ResourceRecommendation, RpsScenario, TierResources,
    TimeoutSettings,
};
use thiserror::Error;

/// Idle connections held per pod, as a fraction of open connections
pub const IDLE_RATIO: f64 = 0.4;

/// Connections each Galera node reserves for replication links
pub const GALERA_INTERNAL_CONNS_PER_NODE: u64 = 5;

/// Hard floor for the cluster-side `max_connections` setting
pub const GALERA_MIN_MAX_CONNECTIONS: u64 = 2000;

/// Default spare-capacity fraction added to the Galera connection ceiling
pub const DEFAULT_BUFFER_FRACTION: f64 = 0.2;

/// Safety factor baked into the memory-overhead estimate
const MEMORY_ESTIMATE_SAFETY_FACTOR: f64 = 1.5;

/// Base memory footprint of one OpenFGA pod, before connection overhead
const BASE_MEMORY_MIB: u64 = 256;

/// CPU millicores per 1000 RPS on one pod
const CPU_MILLICORES_PER_1K_RPS: f64 = 500.0;

/// Limits are set to this multiple of requests for burst headroom
const LIMIT_TO_REQUEST_RATIO: u64 = 4;

/// Invalid sizing input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    #[error("target RPS must be positive")]
    ZeroTargetRps,
    #[error("average latency must be positive")]
    ZeroLatency,
    #[error("pod replica count must be positive")]
    ZeroReplicas,
    #[error("safety factor must be at least 1.0")]
    SafetyFactorTooLow,
}

impl RpsScenario {
    /// Reject inputs that would produce a division by zero or an estimate
    /// below the raw demand
    pub fn validate(&self) -> Result<(), SizingError> {
        if self.target_rps == 0 {
            return Err(SizingError::ZeroTargetRps);
        }
        if self.avg_latency_ms == 0 {
            return Err(SizingError::ZeroLatency);
        }
        if self.pod_replicas == 0 {
            return Err(SizingError::ZeroReplicas);
        }
        if !(self.safety_factor >= 1.0) {
            return Err(SizingError::SafetyFactorTooLow);
        }
        Ok(())
    }
}

/// Total connections needed to sustain the scenario's request rate
///
/// `ceil(rps * latency_ms / 1000 * safety_factor)`
pub fn required_connections(scenario: &RpsScenario) -> Result<u64, SizingError> {
    scenario.validate()?;
    let in_flight = f64::from(scenario.target_rps) * f64::from(scenario.avg_latency_ms) / 1000.0;
    Ok((in_flight * scenario.safety_factor).ceil() as u64)
}

/// Split a total connection requirement across pod replicas
///
/// `max_open` rounds up so the fleet always covers the total; `max_idle`
/// is held at [`IDLE_RATIO`] of open.
pub fn per_pod_pool(total_required: u64, pod_replicas: u32) -> Result<PoolSettings, SizingError> {
    if pod_replicas == 0 {
        return Err(SizingError::ZeroReplicas);
    }
    let replicas = u64::from(pod_replicas);
    let max_open = total_required.div_ceil(replicas);
    let max_idle = (max_open as f64 * IDLE_RATIO).ceil() as u64;
    Ok(PoolSettings { max_open, max_idle })
}

/// Cluster-side `max_connections` ceiling for the Galera nodes
///
/// Covers client connections, internal replication links, and a spare
/// buffer, and never goes below [`GALERA_MIN_MAX_CONNECTIONS`].
pub fn galera_max_connections(
    total_open_conns: u64,
    topology: &GaleraTopology,
    buffer_fraction: f64,
) -> u64 {
    let internal = u64::from(topology.node_count) * GALERA_INTERNAL_CONNS_PER_NODE;
    let buffer = (total_open_conns as f64 * buffer_fraction.max(0.0)).ceil() as u64;
    (total_open_conns + internal + buffer).max(GALERA_MIN_MAX_CONNECTIONS)
}

/// Recommended Galera applier thread count
pub fn wsrep_slave_threads(topology: &GaleraTopology) -> u32 {
    topology.node_count * 2
}

/// Fixed connection lifetime policy: recycle idle connections after 60s,
/// rotate every connection after 10 minutes
pub fn recommended_timeouts() -> TimeoutSettings {
    TimeoutSettings {
        conn_max_idle_time_secs: 60,
        conn_max_lifetime_secs: 600,
    }
}

/// CPU and memory recommendations for both tiers
///
/// The service tier scales linearly with throughput per pod plus a
/// per-connection memory overhead; the database tier gets a fixed
/// conservative per-node footprint.
pub fn resource_estimate(
    target_rps: u32,
    avg_latency_ms: u32,
    pod_replicas: u32,
) -> Result<TierResources, SizingError> {
    if pod_replicas == 0 {
        return Err(SizingError::ZeroReplicas);
    }

    let rps_per_pod = f64::from(target_rps) / f64::from(pod_replicas);
    let cpu_request = (rps_per_pod / 1000.0 * CPU_MILLICORES_PER_1K_RPS).ceil() as u64;

    let total_conns = required_connections(&RpsScenario {
        target_rps,
        avg_latency_ms,
        safety_factor: MEMORY_ESTIMATE_SAFETY_FACTOR,
        pod_replicas,
    })?;
    // ~0.5 MiB per connection, truncated as in the original estimate
    let connection_memory =
        (total_conns as f64 / f64::from(pod_replicas) / 1000.0 * 500.0) as u64;
    let memory_request = BASE_MEMORY_MIB + connection_memory;

    Ok(TierResources {
        openfga: ResourceRecommendation {
            cpu_request_millicores: cpu_request,
            cpu_limit_millicores: cpu_request * LIMIT_TO_REQUEST_RATIO,
            memory_request_mib: memory_request,
            memory_limit_mib: memory_request * LIMIT_TO_REQUEST_RATIO,
        },
        mariadb: ResourceRecommendation {
            cpu_request_millicores: 1000,
            cpu_limit_millicores: 4000,
            memory_request_mib: 2048,
            memory_limit_mib: 4096,
        },
    })
}

/// Named scenario presets used for quick what-if runs
pub fn preset(name: &str) -> Option<RpsScenario> {
    match name {
        "small" => Some(RpsScenario {
            target_rps: 1000,
            avg_latency_ms: 50,
            safety_factor: 1.3,
            pod_replicas: 3,
        }),
        "medium" => Some(RpsScenario {
            target_rps: 5000,
            avg_latency_ms: 50,
            safety_factor: 1.5,
            pod_replicas: 5,
        }),
        "large" => Some(RpsScenario {
            target_rps: 10000,
            avg_latency_ms: 50,
            safety_factor: 1.5,
            pod_replicas: 10,
        }),
        "xlarge" => Some(RpsScenario {
            target_rps: 20000,
            avg_latency_ms: 50,
            safety_factor: 1.5,
            pod_replicas: 15,
        }),
        _ => None,
    }
}

/// Preset names, in size order
pub const PRESET_NAMES: [&str; 4] = ["small", "medium", "large", "xlarge"];

#[cfg(test)]
mod tests {
    use super::*;

    fn large() -> RpsScenario {
        RpsScenario {
            target_rps: 10000,
            avg_latency_ms: 50,
            safety_factor: 1.5,
            pod_replicas: 10,
        }
    }

    #[test]
    fn test_required_connections_large_scenario() {
        // ceil(10000 * 50 / 1000 * 1.5) = 750
        assert_eq!(required_connections(&large()), Ok(750));
    }

    #[test]
    fn test_required_connections_rounds_up() {
        let scenario = RpsScenario {
            target_rps: 333,
            avg_latency_ms: 7,
            safety_factor: 1.3,
            pod_replicas: 2,
        };
        // 333 * 7 / 1000 * 1.3 = 3.0303 -> 4
        assert_eq!(required_connections(&scenario), Ok(4));
    }

    #[test]
    fn test_required_connections_at_least_unrounded_product() {
        for rps in [100u32, 999, 10000] {
            for latency in [7u32, 50, 120] {
                for sf in [1.0, 1.3, 1.7] {
                    let scenario = RpsScenario {
                        target_rps: rps,
                        avg_latency_ms: latency,
                        safety_factor: sf,
                        pod_replicas: 4,
                    };
                    let got = required_connections(&scenario).unwrap();
                    let raw = f64::from(rps) * f64::from(latency) / 1000.0 * sf;
                    assert!(got as f64 >= raw, "{got} < {raw}");
                }
            }
        }
    }

    #[test]
    fn test_required_connections_monotonic_in_rate() {
        let mut prev = 0;
        for rps in (1000..=20000).step_by(1000) {
            let scenario = RpsScenario {
                target_rps: rps,
                avg_latency_ms: 50,
                safety_factor: 1.5,
                pod_replicas: 8,
            };
            let got = required_connections(&scenario).unwrap();
            assert!(got >= prev);
            prev = got;
        }
    }

    #[test]
    fn test_invalid_scenarios_rejected() {
        let mut s = large();
        s.target_rps = 0;
        assert_eq!(required_connections(&s), Err(SizingError::ZeroTargetRps));

        let mut s = large();
        s.avg_latency_ms = 0;
        assert_eq!(required_connections(&s), Err(SizingError::ZeroLatency));

        let mut s = large();
        s.pod_replicas = 0;
        assert_eq!(required_connections(&s), Err(SizingError::ZeroReplicas));

        let mut s = large();
        s.safety_factor = 0.9;
        assert_eq!(
            required_connections(&s),
            Err(SizingError::SafetyFactorTooLow)
        );
    }

    #[test]
    fn test_per_pod_pool_large_scenario() {
        let pool = per_pod_pool(750, 10).unwrap();
        assert_eq!(pool.max_open, 75);
        assert_eq!(pool.max_idle, 30);
    }

    #[test]
    fn test_per_pod_pool_never_under_provisions() {
        for total in [1u64, 99, 750, 1001] {
            for replicas in [1u32, 3, 8, 10] {
                let pool = per_pod_pool(total, replicas).unwrap();
                assert!(pool.max_open * u64::from(replicas) >= total);
            }
        }
    }

    #[test]
    fn test_per_pod_pool_zero_replicas_fails_fast() {
        assert_eq!(per_pod_pool(750, 0), Err(SizingError::ZeroReplicas));
    }

    #[test]
    fn test_galera_max_connections_floor() {
        let topo = GaleraTopology { node_count: 3 };
        // 750 + 15 + 150 = 915, floored at 2000
        assert_eq!(galera_max_connections(750, &topo, 0.2), 2000);
        assert_eq!(galera_max_connections(0, &topo, 0.0), 2000);
    }

    #[test]
    fn test_galera_max_connections_above_floor() {
        let topo = GaleraTopology { node_count: 3 };
        // 3000 + 15 + 600 = 3615
        assert_eq!(galera_max_connections(3000, &topo, 0.2), 3615);
    }

    #[test]
    fn test_galera_floor_holds_for_any_inputs() {
        for total in [0u64, 10, 1500, 5000] {
            for nodes in [0u32, 1, 3, 9] {
                for buffer in [-0.5, 0.0, 0.2, 1.0] {
                    let topo = GaleraTopology { node_count: nodes };
                    assert!(
                        galera_max_connections(total, &topo, buffer)
                            >= GALERA_MIN_MAX_CONNECTIONS
                    );
                }
            }
        }
    }

    #[test]
    fn test_timeouts_are_fixed_policy() {
        let t = recommended_timeouts();
        assert_eq!(t.conn_max_idle_time_secs, 60);
        assert_eq!(t.conn_max_lifetime_secs, 600);
    }

    #[test]
    fn test_wsrep_slave_threads() {
        assert_eq!(wsrep_slave_threads(&GaleraTopology { node_count: 3 }), 6);
    }

    #[test]
    fn test_resource_estimate_large_scenario() {
        let tiers = resource_estimate(10000, 50, 10).unwrap();
        // 1000 RPS per pod -> 500m request, 2000m limit
        assert_eq!(tiers.openfga.cpu_request_millicores, 500);
        assert_eq!(tiers.openfga.cpu_limit_millicores, 2000);
        // 256 + floor(750 / 10 / 1000 * 500) = 256 + 37 = 293
        assert_eq!(tiers.openfga.memory_request_mib, 293);
        assert_eq!(tiers.openfga.memory_limit_mib, 293 * 4);
        // Database tier is a fixed footprint
        assert_eq!(tiers.mariadb.cpu_request_millicores, 1000);
        assert_eq!(tiers.mariadb.memory_request_mib, 2048);
    }

    #[test]
    fn test_resource_estimate_zero_replicas_fails_fast() {
        assert_eq!(
            resource_estimate(10000, 50, 0),
            Err(SizingError::ZeroReplicas)
        );
    }

    #[test]
    fn test_presets_cover_all_names() {
        for name in PRESET_NAMES {
            let scenario = preset(name).unwrap();
            assert!(scenario.validate().is_ok());
        }
        assert!(preset("galactic").is_none());
    }
}
