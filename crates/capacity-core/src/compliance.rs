//! Threshold evaluation of declared workload and pool configuration
//!
//! Issues are blocking; recommendations are informational. Thresholds are
//! the fixed high-RPS deployment baseline: the figures a 10k RPS target
//! was validated against.

use crate::models::{
    EvaluationResult, FleetTotals, GaleraTopology, PoolConfig, WorkloadRole, WorkloadSpec,
};
use crate::units::{parse_cpu_millicores, parse_memory_mib, Quantity};

/// Service tier: minimum CPU request in millicores
pub const SERVICE_MIN_CPU_MILLICORES: u64 = 500;
/// Service tier: CPU request above this draws a recommendation
pub const SERVICE_HIGH_CPU_MILLICORES: u64 = 1000;
/// Service tier: minimum memory request in MiB
pub const SERVICE_MIN_MEMORY_MIB: u64 = 256;
/// Service tier: memory request above this draws a recommendation
pub const SERVICE_HIGH_MEMORY_MIB: u64 = 1024;
/// Service tier: minimum replica count for the target throughput
pub const SERVICE_MIN_REPLICAS: u32 = 8;
/// Service tier: replica count above this draws a cost recommendation
pub const SERVICE_HIGH_REPLICAS: u32 = 20;

/// Database tier: minimum CPU request in millicores
pub const DATABASE_MIN_CPU_MILLICORES: u64 = 1000;
/// Database tier: minimum memory request in MiB
pub const DATABASE_MIN_MEMORY_MIB: u64 = 2048;
/// Database tier: memory request above this draws a recommendation
pub const DATABASE_HIGH_MEMORY_MIB: u64 = 8192;

/// Pool: minimum MAX_OPEN_CONNS
pub const POOL_MIN_OPEN_CONNS: i64 = 100;
/// Pool: MAX_OPEN_CONNS above this draws a recommendation
pub const POOL_HIGH_OPEN_CONNS: i64 = 300;
/// Pool: minimum MAX_IDLE_CONNS
pub const POOL_MIN_IDLE_CONNS: i64 = 50;

/// Fleet: minimum total CPU across all workloads, in millicores
pub const FLEET_MIN_CPU_MILLICORES: u64 = 10_000;
/// Fleet: minimum total memory across all workloads, in MiB
pub const FLEET_MIN_MEMORY_MIB: u64 = 10 * 1024;

/// Evaluate one workload against its role's rule set
///
/// The expected Galera replica count comes from the topology rather than a
/// hard-coded 3, so a five-node cluster is checked against five.
pub fn evaluate(workload: &WorkloadSpec, topology: &GaleraTopology) -> EvaluationResult {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    let mut unknowns = Vec::new();

    let cpu_request = parsed_or_unknown(
        parse_cpu_millicores(&workload.cpu_request),
        "CPU request",
        &mut unknowns,
    );
    let memory_request = parsed_or_unknown(
        parse_memory_mib(&workload.memory_request),
        "memory request",
        &mut unknowns,
    );

    match workload.role {
        WorkloadRole::Service => {
            if let Some(cpu) = cpu_request {
                if cpu < SERVICE_MIN_CPU_MILLICORES {
                    issues.push(format!(
                        "CPU request {} too low, recommend at least {}m",
                        workload.cpu_request, SERVICE_MIN_CPU_MILLICORES
                    ));
                } else if cpu > SERVICE_HIGH_CPU_MILLICORES {
                    recommendations.push(format!(
                        "CPU request {} above {}m, verify it is needed",
                        workload.cpu_request, SERVICE_HIGH_CPU_MILLICORES
                    ));
                }
            }
            if let Some(mem) = memory_request {
                if mem < SERVICE_MIN_MEMORY_MIB {
                    issues.push(format!(
                        "memory request {} too low, recommend at least {}Mi",
                        workload.memory_request, SERVICE_MIN_MEMORY_MIB
                    ));
                } else if mem > SERVICE_HIGH_MEMORY_MIB {
                    recommendations.push(format!(
                        "memory request {} above {}Mi, may be over-provisioned",
                        workload.memory_request, SERVICE_HIGH_MEMORY_MIB
                    ));
                }
            }
            if workload.replicas < SERVICE_MIN_REPLICAS {
                issues.push(format!(
                    "{} replicas insufficient for target throughput, recommend at least {}",
                    workload.replicas, SERVICE_MIN_REPLICAS
                ));
            } else if workload.replicas > SERVICE_HIGH_REPLICAS {
                recommendations.push(format!(
                    "{} replicas is high, verify the cost budget",
                    workload.replicas
                ));
            }
        }
        WorkloadRole::Database => {
            if let Some(cpu) = cpu_request {
                if cpu < DATABASE_MIN_CPU_MILLICORES {
                    issues.push(format!(
                        "CPU request {} too low, recommend at least {}m (1 core)",
                        workload.cpu_request, DATABASE_MIN_CPU_MILLICORES
                    ));
                }
            }
            if let Some(mem) = memory_request {
                if mem < DATABASE_MIN_MEMORY_MIB {
                    issues.push(format!(
                        "memory request {} too low, recommend at least 2Gi",
                        workload.memory_request
                    ));
                } else if mem > DATABASE_HIGH_MEMORY_MIB {
                    recommendations.push(format!(
                        "memory request {} above 8Gi, verify buffer pool sizing",
                        workload.memory_request
                    ));
                }
            }
            if workload.replicas != topology.node_count {
                issues.push(format!(
                    "Galera replica count should be {}, found {}",
                    topology.node_count, workload.replicas
                ));
            }
        }
    }

    EvaluationResult::finish(
        workload.name.clone(),
        Some(workload.role),
        issues,
        recommendations,
        unknowns,
    )
}

/// Evaluate a declared connection pool configuration
pub fn evaluate_pool(pool: &PoolConfig) -> EvaluationResult {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    let mut unknowns = Vec::new();

    match pool.max_open_conns {
        Some(max_open) => {
            if max_open < POOL_MIN_OPEN_CONNS {
                issues.push(format!(
                    "MAX_OPEN_CONNS={max_open} too low, recommend at least {POOL_MIN_OPEN_CONNS}"
                ));
            } else if max_open > POOL_HIGH_OPEN_CONNS {
                recommendations.push(format!(
                    "MAX_OPEN_CONNS={max_open} is high, verify the database connection ceiling"
                ));
            }
        }
        None => unknowns.push("MAX_OPEN_CONNS not declared, unable to verify".to_string()),
    }

    match pool.max_idle_conns {
        Some(max_idle) => {
            if max_idle < POOL_MIN_IDLE_CONNS {
                issues.push(format!(
                    "MAX_IDLE_CONNS={max_idle} too low, recommend at least {POOL_MIN_IDLE_CONNS}"
                ));
            }
        }
        None => unknowns.push("MAX_IDLE_CONNS not declared, unable to verify".to_string()),
    }

    EvaluationResult::finish(
        "connection-pool".to_string(),
        None,
        issues,
        recommendations,
        unknowns,
    )
}

/// Sum resource requests across workloads (request x replicas)
///
/// Unknown or unparsable values are skipped; they surface per workload
/// through [`evaluate`] instead of silently counting as zero here.
pub fn fleet_totals(workloads: &[WorkloadSpec]) -> FleetTotals {
    let mut totals = FleetTotals::default();
    for workload in workloads {
        let replicas = u64::from(workload.replicas);
        if let Ok(Quantity::Known(cpu)) = parse_cpu_millicores(&workload.cpu_request) {
            totals.cpu_millicores += cpu * replicas;
        }
        if let Ok(Quantity::Known(mem)) = parse_memory_mib(&workload.memory_request) {
            totals.memory_mib += mem * replicas;
        }
    }
    totals
}

/// Check fleet totals against the high-RPS capacity floors
pub fn evaluate_fleet(totals: &FleetTotals) -> EvaluationResult {
    let mut issues = Vec::new();

    if totals.cpu_millicores < FLEET_MIN_CPU_MILLICORES {
        issues.push(format!(
            "total CPU {:.2} cores below the {}-core floor for the target throughput",
            totals.cpu_millicores as f64 / 1000.0,
            FLEET_MIN_CPU_MILLICORES / 1000
        ));
    }
    if totals.memory_mib < FLEET_MIN_MEMORY_MIB {
        issues.push(format!(
            "total memory {:.2} GiB below the {}-GiB floor for the target throughput",
            totals.memory_mib as f64 / 1024.0,
            FLEET_MIN_MEMORY_MIB / 1024
        ));
    }

    EvaluationResult::finish("fleet".to_string(), None, issues, Vec::new(), Vec::new())
}

fn parsed_or_unknown(
    parsed: Result<Quantity, crate::units::UnitParseError>,
    field: &str,
    unknowns: &mut Vec<String>,
) -> Option<u64> {
    match parsed {
        Ok(Quantity::Known(v)) => Some(v),
        Ok(Quantity::NotApplicable) => {
            unknowns.push(format!("{field} not set, unable to verify"));
            None
        }
        Err(err) => {
            unknowns.push(format!("{field} {err}, unable to verify"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EvalStatus;

    fn topology() -> GaleraTopology {
        GaleraTopology { node_count: 3 }
    }

    fn service(replicas: u32, cpu: &str, mem: &str) -> WorkloadSpec {
        WorkloadSpec {
            name: "openfga-server".to_string(),
            replicas,
            cpu_request: cpu.to_string(),
            cpu_limit: "2000m".to_string(),
            memory_request: mem.to_string(),
            memory_limit: "1Gi".to_string(),
            role: WorkloadRole::Service,
        }
    }

    fn database(replicas: u32, cpu: &str, mem: &str) -> WorkloadSpec {
        WorkloadSpec {
            name: "mariadb-galera".to_string(),
            replicas,
            cpu_request: cpu.to_string(),
            cpu_limit: "4000m".to_string(),
            memory_request: mem.to_string(),
            memory_limit: "4Gi".to_string(),
            role: WorkloadRole::Database,
        }
    }

    #[test]
    fn test_compliant_service_workload() {
        let result = evaluate(&service(10, "800m", "384Mi"), &topology());
        assert_eq!(result.status, EvalStatus::Ok);
        assert!(result.issues.is_empty());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_service_cpu_boundary_is_exclusive() {
        // Exactly 500m passes; 499m does not
        let at = evaluate(&service(10, "500m", "384Mi"), &topology());
        assert!(at.issues.is_empty());

        let below = evaluate(&service(10, "499m", "384Mi"), &topology());
        assert_eq!(below.status, EvalStatus::Warning);
        assert!(below.issues.iter().any(|i| i.contains("CPU request")));
    }

    #[test]
    fn test_service_high_cpu_is_recommendation_not_issue() {
        let result = evaluate(&service(10, "1500m", "384Mi"), &topology());
        assert_eq!(result.status, EvalStatus::Ok);
        assert_eq!(result.recommendations.len(), 1);
    }

    #[test]
    fn test_service_replica_thresholds() {
        let low = evaluate(&service(5, "800m", "384Mi"), &topology());
        assert!(low
            .issues
            .iter()
            .any(|i| i.contains("insufficient for target throughput")));

        let high = evaluate(&service(25, "800m", "384Mi"), &topology());
        assert_eq!(high.status, EvalStatus::Ok);
        assert_eq!(high.recommendations.len(), 1);
    }

    #[test]
    fn test_compliant_database_workload() {
        let result = evaluate(&database(3, "1200m", "3072Mi"), &topology());
        assert_eq!(result.status, EvalStatus::Ok);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_database_replica_count_from_topology() {
        let wrong = evaluate(&database(2, "1200m", "3072Mi"), &topology());
        assert!(wrong
            .issues
            .iter()
            .any(|i| i.contains("replica count should be 3")));

        // A five-node topology expects five replicas
        let five = GaleraTopology { node_count: 5 };
        let result = evaluate(&database(5, "1200m", "3072Mi"), &five);
        assert_eq!(result.status, EvalStatus::Ok);
    }

    #[test]
    fn test_database_memory_thresholds() {
        let low = evaluate(&database(3, "1200m", "1Gi"), &topology());
        assert_eq!(low.status, EvalStatus::Warning);

        let high = evaluate(&database(3, "1200m", "12Gi"), &topology());
        assert_eq!(high.status, EvalStatus::Ok);
        assert_eq!(high.recommendations.len(), 1);
    }

    #[test]
    fn test_unknown_values_are_surfaced_not_compliant() {
        let result = evaluate(&service(10, "N/A", "384Mi"), &topology());
        assert_eq!(result.unknowns.len(), 1);
        assert!(result.unknowns[0].contains("unable to verify"));

        let garbage = evaluate(&service(10, "lots", "384Mi"), &topology());
        assert_eq!(garbage.unknowns.len(), 1);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let workload = service(5, "499m", "128Mi");
        let first = evaluate(&workload, &topology());
        let second = evaluate(&workload, &topology());
        assert_eq!(first, second);
    }

    #[test]
    fn test_pool_too_low_is_issue() {
        let result = evaluate_pool(&PoolConfig {
            max_open_conns: Some(50),
            max_idle_conns: Some(60),
        });
        assert_eq!(result.status, EvalStatus::Warning);
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("too low, recommend at least 100")));
    }

    #[test]
    fn test_pool_high_is_recommendation() {
        let result = evaluate_pool(&PoolConfig {
            max_open_conns: Some(350),
            max_idle_conns: Some(60),
        });
        assert_eq!(result.status, EvalStatus::Ok);
        assert!(result.issues.is_empty());
        assert_eq!(result.recommendations.len(), 1);
    }

    #[test]
    fn test_pool_idle_too_low() {
        let result = evaluate_pool(&PoolConfig {
            max_open_conns: Some(150),
            max_idle_conns: Some(20),
        });
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("MAX_IDLE_CONNS=20")));
    }

    #[test]
    fn test_pool_undeclared_values_are_unknown() {
        let result = evaluate_pool(&PoolConfig::default());
        assert_eq!(result.status, EvalStatus::Ok);
        assert_eq!(result.unknowns.len(), 2);
    }

    #[test]
    fn test_fleet_totals_sum_request_times_replicas() {
        let workloads = vec![
            service(10, "800m", "384Mi"),
            database(3, "1200m", "3072Mi"),
        ];
        let totals = fleet_totals(&workloads);
        assert_eq!(totals.cpu_millicores, 10 * 800 + 3 * 1200);
        assert_eq!(totals.memory_mib, 10 * 384 + 3 * 3072);
    }

    #[test]
    fn test_fleet_totals_skip_unknown_values() {
        let workloads = vec![service(10, "N/A", "384Mi")];
        let totals = fleet_totals(&workloads);
        assert_eq!(totals.cpu_millicores, 0);
        assert_eq!(totals.memory_mib, 3840);
    }

    #[test]
    fn test_fleet_floors() {
        let short = evaluate_fleet(&FleetTotals {
            cpu_millicores: 9000,
            memory_mib: 8 * 1024,
        });
        assert_eq!(short.status, EvalStatus::Warning);
        assert_eq!(short.issues.len(), 2);

        let enough = evaluate_fleet(&FleetTotals {
            cpu_millicores: 17_200,
            memory_mib: 13_056,
        });
        assert_eq!(enough.status, EvalStatus::Ok);
    }
}
