//! The `monitor` command: live per-pod capacity from Prometheus

use anyhow::Result;
use capacity_core::trend::{capacity_usage, load_level, rps_trend};
use capacity_core::{LoadLevel, Trend};
use chrono::Local;
use serde::Serialize;
use std::collections::HashMap;
use tabled::Tabled;

use crate::output::{
    color_latency, color_load_level, print_info, print_success, print_warning, trend_arrow,
    OutputFormat,
};
use crate::prometheus::PromClient;

/// One pod's observed state in a report cycle
#[derive(Debug, Clone, Serialize)]
pub struct PodSample {
    pub pod: String,
    pub rps: f64,
    pub trend: Trend,
    pub capacity_pct: f64,
    pub error_rate_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_p50_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_p99_ms: Option<f64>,
    pub level: LoadLevel,
}

/// Galera-side gauges for the same cycle
#[derive(Debug, Clone, Serialize)]
pub struct GaleraSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_connected: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MonitorReport {
    pub timestamp: String,
    pub namespace: String,
    pub capacity_per_pod: u32,
    pub pods: Vec<PodSample>,
    pub galera: GaleraSample,
}

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "RPS")]
    rps: String,
    #[tabled(rename = "Trend")]
    trend: String,
    #[tabled(rename = "Capacity")]
    capacity: String,
    #[tabled(rename = "Err%")]
    error_rate: String,
    #[tabled(rename = "p50")]
    p50: String,
    #[tabled(rename = "p99")]
    p99: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub async fn run(
    client: &PromClient,
    namespace: &str,
    capacity_per_pod: u32,
    interval: u64,
    watch: bool,
    format: OutputFormat,
) -> Result<()> {
    if !client.healthy().await {
        anyhow::bail!("Prometheus is not reachable; check the URL or the port-forward");
    }

    // Trend state lives here, carried across cycles
    let mut previous_rps = HashMap::new();

    loop {
        let report = collect(client, namespace, capacity_per_pod, &mut previous_rps).await?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Table => print_table(&report),
        }

        if !watch {
            return Ok(());
        }
        tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
    }
}

async fn collect(
    client: &PromClient,
    namespace: &str,
    capacity_per_pod: u32,
    previous_rps: &mut HashMap<String, f64>,
) -> Result<MonitorReport> {
    let rps = client.pod_rps(namespace).await?;
    let error_rates = client.pod_error_rate(namespace).await.unwrap_or_default();
    let p50 = client.pod_latency_ms(namespace, 0.5).await.unwrap_or_default();
    let p99 = client.pod_latency_ms(namespace, 0.99).await.unwrap_or_default();

    let mut pods: Vec<PodSample> = rps
        .into_iter()
        .map(|(pod, rps)| {
            let error_rate_pct = error_rates.get(&pod).copied().unwrap_or(0.0);
            let capacity_pct = capacity_usage(rps, f64::from(capacity_per_pod));
            PodSample {
                trend: rps_trend(previous_rps, &pod, rps),
                capacity_pct,
                error_rate_pct,
                latency_p50_ms: p50.get(&pod).copied(),
                latency_p99_ms: p99.get(&pod).copied(),
                level: load_level(capacity_pct, error_rate_pct),
                pod,
                rps,
            }
        })
        .collect();
    pods.sort_by(|a, b| a.pod.cmp(&b.pod));

    let galera = GaleraSample {
        cluster_size: client.galera_cluster_size(namespace).await.unwrap_or(None),
        ready: client.galera_ready(namespace).await.unwrap_or(None),
        threads_connected: client.threads_connected(namespace).await.unwrap_or(None),
    };

    Ok(MonitorReport {
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        namespace: namespace.to_string(),
        capacity_per_pod,
        pods,
        galera,
    })
}

fn print_table(report: &MonitorReport) {
    print_info(&format!(
        "{} | namespace {} | theoretical capacity {} RPS/pod",
        report.timestamp, report.namespace, report.capacity_per_pod
    ));

    if report.pods.is_empty() {
        print_warning("No pods reporting request metrics");
    } else {
        let rows: Vec<PodRow> = report.pods.iter().map(pod_row).collect();
        let table = tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string();
        println!("{table}");

        let total_rps: f64 = report.pods.iter().map(|p| p.rps).sum();
        println!(
            "Total: {:.1} RPS across {} pods",
            total_rps,
            report.pods.len()
        );

        let overloaded: Vec<&PodSample> = report
            .pods
            .iter()
            .filter(|p| matches!(p.level, LoadLevel::Overload | LoadLevel::Critical))
            .collect();
        for pod in overloaded {
            print_warning(&format!(
                "{} at {:.1}% capacity, consider adding replicas",
                pod.pod, pod.capacity_pct
            ));
        }
    }

    match (report.galera.cluster_size, report.galera.ready) {
        (Some(size), Some(ready)) if ready >= 1.0 => {
            print_success(&format!("Galera cluster ready, {size:.0} nodes"));
        }
        (Some(size), _) => {
            print_warning(&format!("Galera cluster not ready ({size:.0} nodes seen)"));
        }
        _ => print_warning("Galera metrics not available"),
    }
    if let Some(threads) = report.galera.threads_connected {
        println!("Database threads connected: {threads:.0}");
    }
}

fn pod_row(sample: &PodSample) -> PodRow {
    PodRow {
        pod: sample.pod.clone(),
        rps: format!("{:.1}", sample.rps),
        trend: trend_arrow(sample.trend),
        capacity: format!("{:.1}%", sample.capacity_pct),
        error_rate: format!("{:.2}", sample.error_rate_pct),
        p50: sample
            .latency_p50_ms
            .map(|v| color_latency(v, 50.0, 100.0))
            .unwrap_or_else(|| "-".to_string()),
        p99: sample
            .latency_p99_ms
            .map(|v| color_latency(v, 150.0, 300.0))
            .unwrap_or_else(|| "-".to_string()),
        status: color_load_level(sample.level),
    }
}
