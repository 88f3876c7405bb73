//! Core data models shared by the sizing and compliance modules

use serde::{Deserialize, Serialize};

/// Throughput scenario driving the sizing formulas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RpsScenario {
    /// Target request rate in requests per second
    pub target_rps: u32,
    /// Average per-request latency in milliseconds
    pub avg_latency_ms: u32,
    /// Multiplicative margin applied to the raw estimate (>= 1.0)
    pub safety_factor: f64,
    /// Number of OpenFGA pod replicas
    pub pod_replicas: u32,
}

/// Galera cluster topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaleraTopology {
    /// Number of Galera nodes; 3 gives a quorum-capable cluster
    pub node_count: u32,
}

impl Default for GaleraTopology {
    fn default() -> Self {
        Self { node_count: 3 }
    }
}

/// Per-pod connection pool bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    pub max_open: u64,
    pub max_idle: u64,
}

/// Recommended connection lifetime settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    pub conn_max_idle_time_secs: u64,
    pub conn_max_lifetime_secs: u64,
}

/// Resource request/limit recommendation for one workload role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecommendation {
    pub cpu_request_millicores: u64,
    pub cpu_limit_millicores: u64,
    pub memory_request_mib: u64,
    pub memory_limit_mib: u64,
}

/// Resource recommendations for both tiers of the deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierResources {
    pub openfga: ResourceRecommendation,
    pub mariadb: ResourceRecommendation,
}

/// Workload role, inferred from the deployment name by the manifest layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadRole {
    /// Stateless OpenFGA service tier
    Service,
    /// Replicated MariaDB Galera tier
    Database,
}

impl std::fmt::Display for WorkloadRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadRole::Service => write!(f, "service"),
            WorkloadRole::Database => write!(f, "database"),
        }
    }
}

/// Declared resource specification for one workload, as read from a manifest
///
/// Resource fields keep the platform's native string syntax ("500m",
/// "256Mi"); parsing happens inside the compliance model so unknown values
/// stay distinguishable from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub name: String,
    pub replicas: u32,
    pub cpu_request: String,
    pub cpu_limit: String,
    pub memory_request: String,
    pub memory_limit: String,
    pub role: WorkloadRole,
}

/// Declared connection pool configuration, independent of workload role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_open_conns: Option<i64>,
    pub max_idle_conns: Option<i64>,
}

/// Overall verdict for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalStatus {
    Ok,
    Warning,
}

impl std::fmt::Display for EvalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalStatus::Ok => write!(f, "ok"),
            EvalStatus::Warning => write!(f, "warning"),
        }
    }
}

/// Result of evaluating one subject against the rule sets
///
/// Issues are blocking non-compliance; recommendations are informational
/// and never affect the status. Unknowns list fields that could not be
/// verified and are never treated as compliant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<WorkloadRole>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub unknowns: Vec<String>,
    pub status: EvalStatus,
}

impl EvaluationResult {
    /// Derive the status from the collected messages: warning iff any issue
    pub(crate) fn finish(
        subject: String,
        role: Option<WorkloadRole>,
        issues: Vec<String>,
        recommendations: Vec<String>,
        unknowns: Vec<String>,
    ) -> Self {
        let status = if issues.is_empty() {
            EvalStatus::Ok
        } else {
            EvalStatus::Warning
        };
        Self {
            subject,
            role,
            issues,
            recommendations,
            unknowns,
            status,
        }
    }
}

/// Fleet-wide resource totals (request x replicas, summed over workloads)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetTotals {
    pub cpu_millicores: u64,
    pub memory_mib: u64,
}
