//! Kubernetes manifest extraction
//!
//! Reads multi-document YAML and pulls out just what the compliance model
//! needs: workload resource declarations from Deployments/StatefulSets and
//! connection pool settings from ConfigMaps. Fields that are absent become
//! the "N/A" sentinel so the model reports them as unknown instead of zero.

use anyhow::{Context, Result};
use capacity_core::units::NOT_APPLICABLE;
use capacity_core::{PoolConfig, WorkloadRole, WorkloadSpec};
use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

const MAX_OPEN_CONNS_KEY: &str = "OPENFGA_DATASTORE_MAX_OPEN_CONNS";
const MAX_IDLE_CONNS_KEY: &str = "OPENFGA_DATASTORE_MAX_IDLE_CONNS";

/// Everything extracted from one manifest file
#[derive(Debug, Clone, Default)]
pub struct ManifestInventory {
    pub workloads: Vec<WorkloadSpec>,
    pub pool: PoolConfig,
}

impl ManifestInventory {
    /// Whether any pool setting was declared anywhere in the file
    pub fn pool_declared(&self) -> bool {
        self.pool.max_open_conns.is_some() || self.pool.max_idle_conns.is_some()
    }
}

/// Parse a multi-document YAML string
pub fn parse_manifests(content: &str) -> Result<ManifestInventory> {
    let mut inventory = ManifestInventory::default();

    for document in serde_yaml::Deserializer::from_str(content) {
        let doc = match Value::deserialize(document) {
            Ok(Value::Null) => continue,
            Ok(doc) => doc,
            Err(err) => return Err(err).context("Invalid YAML document"),
        };

        match doc.get("kind").and_then(Value::as_str) {
            Some("Deployment") | Some("StatefulSet") => {
                if let Some(workload) = extract_workload(&doc) {
                    inventory.workloads.push(workload);
                }
            }
            Some("ConfigMap") => extract_pool(&doc, &mut inventory.pool),
            other => debug!(kind = ?other, "skipping document"),
        }
    }

    Ok(inventory)
}

fn extract_workload(doc: &Value) -> Option<WorkloadSpec> {
    let name = doc
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let spec = doc.get("spec")?;
    let replicas = spec
        .get("replicas")
        .and_then(Value::as_u64)
        .unwrap_or(1) as u32;

    let container = spec
        .get("template")
        .and_then(|t| t.get("spec"))
        .and_then(|s| s.get("containers"))
        .and_then(|c| c.get(0))?;

    let resources = container.get("resources");
    let requests = resources.and_then(|r| r.get("requests"));
    let limits = resources.and_then(|r| r.get("limits"));

    Some(WorkloadSpec {
        role: infer_role(&name),
        name,
        replicas,
        cpu_request: quantity(requests, "cpu"),
        cpu_limit: quantity(limits, "cpu"),
        memory_request: quantity(requests, "memory"),
        memory_limit: quantity(limits, "memory"),
    })
}

fn quantity(section: Option<&Value>, key: &str) -> String {
    section
        .and_then(|s| s.get(key))
        .and_then(Value::as_str)
        .unwrap_or(NOT_APPLICABLE)
        .to_string()
}

/// Database workloads are recognized by name, same convention the charts use
fn infer_role(name: &str) -> WorkloadRole {
    let lower = name.to_lowercase();
    if lower.contains("mariadb") || lower.contains("galera") {
        WorkloadRole::Database
    } else {
        WorkloadRole::Service
    }
}

fn extract_pool(doc: &Value, pool: &mut PoolConfig) {
    let Some(data) = doc.get("data") else {
        return;
    };

    if let Some(value) = lookup_int(data, MAX_OPEN_CONNS_KEY) {
        pool.max_open_conns = Some(value);
    }
    if let Some(value) = lookup_int(data, MAX_IDLE_CONNS_KEY) {
        pool.max_idle_conns = Some(value);
    }
}

fn lookup_int(data: &Value, key: &str) -> Option<i64> {
    data.get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse::<i64>().ok())
}
