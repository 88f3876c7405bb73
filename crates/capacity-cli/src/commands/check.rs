//! The `check` command: manifest evaluation against the high-RPS baseline

use anyhow::{Context, Result};
use capacity_core::compliance::{evaluate, evaluate_fleet, evaluate_pool, fleet_totals};
use capacity_core::{EvalStatus, EvaluationResult, FleetTotals, GaleraTopology};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::manifest;
use crate::output::{
    color_eval_status, format_mib, format_millicores, print_error, print_info, print_section,
    print_success, print_warning, OutputFormat,
};

/// Full result of checking one manifest file
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub workloads: Vec<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<EvaluationResult>,
    pub totals: FleetTotals,
    pub fleet: EvaluationResult,
}

impl CheckReport {
    pub fn has_warnings(&self) -> bool {
        self.workloads
            .iter()
            .chain(self.pool.iter())
            .chain(std::iter::once(&self.fleet))
            .any(|r| r.status == EvalStatus::Warning)
    }
}

/// Row for the workload summary table
#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "Workload")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Replicas")]
    replicas: u32,
    #[tabled(rename = "CPU Req")]
    cpu_request: String,
    #[tabled(rename = "Mem Req")]
    memory_request: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn run(path: &Path, galera_nodes: u32, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let inventory = manifest::parse_manifests(&content)?;
    let report = build_report(&inventory, galera_nodes);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_table(&inventory, &report);
        }
    }

    Ok(())
}

fn build_report(inventory: &manifest::ManifestInventory, galera_nodes: u32) -> CheckReport {
    let topology = GaleraTopology {
        node_count: galera_nodes,
    };

    let workloads = inventory
        .workloads
        .iter()
        .map(|w| evaluate(w, &topology))
        .collect();

    let pool = inventory
        .pool_declared()
        .then(|| evaluate_pool(&inventory.pool));

    let totals = fleet_totals(&inventory.workloads);
    let fleet = evaluate_fleet(&totals);

    CheckReport {
        workloads,
        pool,
        totals,
        fleet,
    }
}

fn print_table(inventory: &manifest::ManifestInventory, report: &CheckReport) {
    if inventory.workloads.is_empty() {
        print_warning("No Deployment or StatefulSet documents found");
        return;
    }

    print_section("Workloads");
    let rows: Vec<WorkloadRow> = inventory
        .workloads
        .iter()
        .zip(&report.workloads)
        .map(|(spec, result)| WorkloadRow {
            name: spec.name.clone(),
            role: spec.role.to_string(),
            replicas: spec.replicas,
            cpu_request: spec.cpu_request.clone(),
            memory_request: spec.memory_request.clone(),
            status: color_eval_status(result.status),
        })
        .collect();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{table}");

    for result in &report.workloads {
        print_messages(result);
    }

    if let Some(pool) = &report.pool {
        print_section("Connection pool");
        if pool.status == EvalStatus::Ok && pool.issues.is_empty() {
            print_success("pool configuration within bounds");
        }
        print_messages(pool);
    }

    print_section("Fleet totals");
    println!(
        "  total CPU:    {} ({:.2} cores)",
        format_millicores(report.totals.cpu_millicores),
        report.totals.cpu_millicores as f64 / 1000.0
    );
    println!(
        "  total memory: {} ({:.2} GiB)",
        format_mib(report.totals.memory_mib),
        report.totals.memory_mib as f64 / 1024.0
    );
    print_messages(&report.fleet);

    println!();
    if report.has_warnings() {
        print_warning("configuration has open issues; see above");
    } else {
        print_success("configuration meets the high-RPS baseline");
    }
}

fn print_messages(result: &EvaluationResult) {
    for issue in &result.issues {
        print_error(&format!("{}: {}", result.subject, issue));
    }
    for recommendation in &result.recommendations {
        print_info(&format!("{}: {}", result.subject, recommendation));
    }
    for unknown in &result.unknowns {
        print_warning(&format!("{}: {}", result.subject, unknown));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capacity_core::{PoolConfig, WorkloadRole, WorkloadSpec};

    fn inventory() -> manifest::ManifestInventory {
        manifest::ManifestInventory {
            workloads: vec![
                WorkloadSpec {
                    name: "openfga-server".to_string(),
                    replicas: 10,
                    cpu_request: "800m".to_string(),
                    cpu_limit: "2000m".to_string(),
                    memory_request: "384Mi".to_string(),
                    memory_limit: "1Gi".to_string(),
                    role: WorkloadRole::Service,
                },
                WorkloadSpec {
                    name: "mariadb-galera".to_string(),
                    replicas: 3,
                    cpu_request: "1200m".to_string(),
                    cpu_limit: "4000m".to_string(),
                    memory_request: "3072Mi".to_string(),
                    memory_limit: "4Gi".to_string(),
                    role: WorkloadRole::Database,
                },
            ],
            pool: PoolConfig {
                max_open_conns: Some(150),
                max_idle_conns: Some(60),
            },
        }
    }

    #[test]
    fn test_clean_inventory_has_no_warnings() {
        let report = build_report(&inventory(), 3);
        assert!(!report.has_warnings());
        assert_eq!(report.totals.cpu_millicores, 10 * 800 + 3 * 1200);
    }

    #[test]
    fn test_pool_issue_surfaces_as_warning() {
        let mut inv = inventory();
        inv.pool.max_open_conns = Some(50);
        let report = build_report(&inv, 3);
        assert!(report.has_warnings());
        assert!(report.pool.unwrap().status == EvalStatus::Warning);
    }

    #[test]
    fn test_undeclared_pool_is_skipped() {
        let mut inv = inventory();
        inv.pool = PoolConfig::default();
        let report = build_report(&inv, 3);
        assert!(report.pool.is_none());
    }

    #[test]
    fn test_small_fleet_fails_floor() {
        let mut inv = inventory();
        inv.workloads.truncate(1);
        inv.workloads[0].replicas = 2;
        let report = build_report(&inv, 3);
        assert_eq!(report.fleet.status, EvalStatus::Warning);
    }
}
