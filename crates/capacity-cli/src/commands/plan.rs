//! The `plan` command: pool sizing and resource recommendations

use anyhow::{bail, Result};
use capacity_core::sizing::{
    self, galera_max_connections, per_pod_pool, recommended_timeouts, required_connections,
    resource_estimate, wsrep_slave_threads,
};
use capacity_core::{
    GaleraTopology, PoolSettings, RpsScenario, TierResources, TimeoutSettings,
};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{format_mib, format_millicores, print_info, print_section, OutputFormat};

/// Complete sizing report for one scenario
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub scenario: RpsScenario,
    pub topology: GaleraTopology,
    pub total_connections: u64,
    pub per_pod_pool: PoolSettings,
    pub timeouts: TimeoutSettings,
    pub galera_max_connections: u64,
    pub wsrep_slave_threads: u32,
    pub resources: TierResources,
}

/// Row for the per-tier resource table
#[derive(Tabled)]
struct TierRow {
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "CPU Req")]
    cpu_request: String,
    #[tabled(rename = "CPU Lim")]
    cpu_limit: String,
    #[tabled(rename = "Mem Req")]
    memory_request: String,
    #[tabled(rename = "Mem Lim")]
    memory_limit: String,
}

/// Build the scenario from a preset name or individual flags
pub fn resolve_scenario(
    preset: Option<&str>,
    rps: u32,
    latency_ms: u32,
    safety_factor: f64,
    replicas: u32,
) -> Result<RpsScenario> {
    let scenario = match preset {
        Some(name) => match sizing::preset(name) {
            Some(scenario) => scenario,
            None => bail!(
                "unknown preset `{}` (expected one of: {})",
                name,
                sizing::PRESET_NAMES.join(", ")
            ),
        },
        None => RpsScenario {
            target_rps: rps,
            avg_latency_ms: latency_ms,
            safety_factor,
            pod_replicas: replicas,
        },
    };
    scenario.validate()?;
    Ok(scenario)
}

pub fn run(
    scenario: &RpsScenario,
    galera_nodes: u32,
    buffer: f64,
    emit_env: bool,
    format: OutputFormat,
) -> Result<()> {
    let topology = GaleraTopology {
        node_count: galera_nodes,
    };

    let total_connections = required_connections(scenario)?;
    let pool = per_pod_pool(total_connections, scenario.pod_replicas)?;
    let timeouts = recommended_timeouts();
    let fleet_open = pool.max_open * u64::from(scenario.pod_replicas);
    let galera_ceiling = galera_max_connections(fleet_open, &topology, buffer);
    let resources = resource_estimate(
        scenario.target_rps,
        scenario.avg_latency_ms,
        scenario.pod_replicas,
    )?;

    let report = PlanReport {
        scenario: *scenario,
        topology,
        total_connections,
        per_pod_pool: pool,
        timeouts,
        galera_max_connections: galera_ceiling,
        wsrep_slave_threads: wsrep_slave_threads(&topology),
        resources,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_table(&report);
        }
    }

    if emit_env {
        print_env_fragment(&report);
    }

    Ok(())
}

fn print_table(report: &PlanReport) {
    print_section("Scenario");
    println!(
        "  target: {} RPS at {}ms, safety factor {}, {} replicas, {} Galera nodes",
        report.scenario.target_rps,
        report.scenario.avg_latency_ms,
        report.scenario.safety_factor,
        report.scenario.pod_replicas,
        report.topology.node_count,
    );

    print_section("Connection pool");
    println!("  total required connections: {}", report.total_connections);
    println!("  per-pod MAX_OPEN_CONNS:     {}", report.per_pod_pool.max_open);
    println!("  per-pod MAX_IDLE_CONNS:     {}", report.per_pod_pool.max_idle);
    println!(
        "  conn max idle time / lifetime: {}s / {}s",
        report.timeouts.conn_max_idle_time_secs, report.timeouts.conn_max_lifetime_secs
    );

    print_section("Galera settings");
    println!("  max_connections:    {}", report.galera_max_connections);
    println!("  wsrep_slave_threads: {}", report.wsrep_slave_threads);

    print_section("Resources per pod");
    let rows = vec![
        tier_row("openfga", &report.resources.openfga),
        tier_row("mariadb", &report.resources.mariadb),
    ];
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{table}");

    print_info(&format!(
        "average connections per Galera node: {}",
        report.total_connections / u64::from(report.topology.node_count.max(1))
    ));
}

fn tier_row(tier: &str, rec: &capacity_core::ResourceRecommendation) -> TierRow {
    TierRow {
        tier: tier.to_string(),
        cpu_request: format_millicores(rec.cpu_request_millicores),
        cpu_limit: format_millicores(rec.cpu_limit_millicores),
        memory_request: format_mib(rec.memory_request_mib),
        memory_limit: format_mib(rec.memory_limit_mib),
    }
}

/// OpenFGA datastore environment fragment, ready to paste into a manifest
fn print_env_fragment(report: &PlanReport) {
    print_section("Environment fragment");
    println!(
        "OPENFGA_DATASTORE_MAX_OPEN_CONNS={}",
        report.per_pod_pool.max_open
    );
    println!(
        "OPENFGA_DATASTORE_MAX_IDLE_CONNS={}",
        report.per_pod_pool.max_idle
    );
    println!(
        "OPENFGA_DATASTORE_CONN_MAX_IDLE_TIME={}s",
        report.timeouts.conn_max_idle_time_secs
    );
    println!(
        "OPENFGA_DATASTORE_CONN_MAX_LIFETIME={}m",
        report.timeouts.conn_max_lifetime_secs / 60
    );
}
