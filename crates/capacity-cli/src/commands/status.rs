//! The `status` command: deployment readiness via kubectl

use anyhow::Result;
use serde::Serialize;

use crate::kube::{self, PodPhase, PodUsage};
use crate::output::{print_error, print_info, print_section, print_success, print_warning, OutputFormat};

/// One readiness check and its outcome
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessCheck {
    pub name: String,
    pub passed: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub namespace: String,
    pub total_pods: usize,
    pub running_pods: usize,
    pub service_running: usize,
    pub galera_running: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub galera_cluster_status: Option<String>,
    pub total_cpu_usage: String,
    pub total_memory_usage: String,
    pub checks: Vec<ReadinessCheck>,
    pub ready: bool,
}

pub async fn run(namespace: &str, galera_nodes: u32, format: OutputFormat) -> Result<()> {
    let pods = kube::pod_phases(namespace).await?;

    let galera_pod = pods
        .iter()
        .find(|p| is_galera(&p.name) && p.phase == "Running")
        .map(|p| p.name.clone());

    let wsrep_status = match &galera_pod {
        Some(pod) => kube::galera_cluster_status(namespace, pod).await.ok(),
        None => None,
    };

    // kubectl top needs metrics-server; degrade to empty usage if absent
    let usage = kube::top_pods(namespace).await.unwrap_or_default();

    let report = build_report(namespace, galera_nodes, &pods, wsrep_status, &usage);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => print_table(&report),
    }

    Ok(())
}

fn build_report(
    namespace: &str,
    galera_nodes: u32,
    pods: &[PodPhase],
    wsrep_status: Option<String>,
    usage: &[PodUsage],
) -> StatusReport {
    let running = |p: &&PodPhase| p.phase == "Running";
    let running_pods = pods.iter().filter(running).count();
    let service_running = pods
        .iter()
        .filter(running)
        .filter(|p| !is_galera(&p.name))
        .count();
    let galera_running = pods
        .iter()
        .filter(running)
        .filter(|p| is_galera(&p.name))
        .count();

    let (total_cpu, total_memory) = sum_usage(usage);

    let cluster_primary = wsrep_status.as_deref() == Some("Primary");
    let checks = vec![
        ReadinessCheck {
            name: "service replicas >= 8 running".to_string(),
            passed: service_running >= 8,
        },
        ReadinessCheck {
            name: format!("Galera replicas = {galera_nodes} running"),
            passed: galera_running == galera_nodes as usize,
        },
        ReadinessCheck {
            name: "Galera cluster status is Primary".to_string(),
            passed: cluster_primary,
        },
    ];
    let ready = checks.iter().all(|c| c.passed);

    StatusReport {
        namespace: namespace.to_string(),
        total_pods: pods.len(),
        running_pods,
        service_running,
        galera_running,
        galera_cluster_status: wsrep_status,
        total_cpu_usage: format!("{total_cpu}m"),
        total_memory_usage: format!("{total_memory}Mi"),
        checks,
        ready,
    }
}

fn is_galera(pod_name: &str) -> bool {
    let lower = pod_name.to_lowercase();
    lower.contains("mariadb") || lower.contains("galera")
}

/// Sum `kubectl top` usage columns; values that fail to parse are skipped
fn sum_usage(usage: &[PodUsage]) -> (u64, u64) {
    let mut cpu = 0;
    let mut memory = 0;
    for pod in usage {
        if let Ok(millis) = pod.cpu.trim_end_matches('m').parse::<u64>() {
            cpu += millis;
        }
        if let Some(gi) = pod.memory.strip_suffix("Gi") {
            if let Ok(v) = gi.parse::<f64>() {
                memory += (v * 1024.0) as u64;
            }
        } else if let Ok(mi) = pod.memory.trim_end_matches("Mi").parse::<u64>() {
            memory += mi;
        }
    }
    (cpu, memory)
}

fn print_table(report: &StatusReport) {
    print_section("Pods");
    println!(
        "  {} total, {} running ({} service, {} galera)",
        report.total_pods, report.running_pods, report.service_running, report.galera_running
    );

    print_section("Galera cluster");
    match &report.galera_cluster_status {
        Some(status) if status == "Primary" => print_success("cluster status: Primary"),
        Some(status) => print_warning(&format!("cluster status: {status}")),
        None => print_warning("cluster status unavailable (no running Galera pod reachable)"),
    }

    print_section("Resource usage");
    println!(
        "  CPU: {}, memory: {}",
        report.total_cpu_usage, report.total_memory_usage
    );
    if report.total_cpu_usage == "0m" {
        print_info("usage totals need metrics-server; install it for live numbers");
    }

    print_section("Readiness checklist");
    for check in &report.checks {
        if check.passed {
            print_success(&check.name);
        } else {
            print_error(&check.name);
        }
    }

    println!();
    if report.ready {
        print_success("deployment is ready for load testing");
    } else {
        print_warning("deployment is not ready; resolve the failed checks first");
    }
}
