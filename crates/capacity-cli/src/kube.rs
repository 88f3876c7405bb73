//! kubectl plumbing
//!
//! Shells out to `kubectl` for the pieces Prometheus cannot answer: pod
//! phases, live resource usage, and the Galera `wsrep_cluster_status`
//! variable read over `kubectl exec`. Parsing is split from process
//! handling so it stays testable without a cluster.

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

/// Name and phase of one pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodPhase {
    pub name: String,
    pub phase: String,
}

/// Live usage of one pod as reported by `kubectl top`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodUsage {
    pub name: String,
    pub cpu: String,
    pub memory: String,
}

/// List pods and their phases in a namespace
pub async fn pod_phases(namespace: &str) -> Result<Vec<PodPhase>> {
    let stdout = run_kubectl(&["get", "pods", "-n", namespace, "-o", "json"]).await?;
    parse_pod_list(&stdout)
}

/// Read `wsrep_cluster_status` from the first Galera pod
pub async fn galera_cluster_status(namespace: &str, pod: &str) -> Result<String> {
    let stdout = run_kubectl(&[
        "exec",
        pod,
        "-n",
        namespace,
        "--",
        "mysql",
        "-e",
        "SHOW STATUS LIKE 'wsrep_cluster_status';",
    ])
    .await?;
    parse_wsrep_status(&stdout).context("wsrep_cluster_status not found in mysql output")
}

/// Live per-pod usage from `kubectl top pods`
pub async fn top_pods(namespace: &str) -> Result<Vec<PodUsage>> {
    let stdout = run_kubectl(&["top", "pods", "-n", namespace, "--no-headers"]).await?;
    Ok(parse_top_output(&stdout))
}

async fn run_kubectl(args: &[&str]) -> Result<String> {
    debug!(?args, "running kubectl");
    let output = Command::new("kubectl")
        .args(args)
        .output()
        .await
        .context("Failed to run kubectl; is it installed and on PATH?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("kubectl {} failed: {}", args.join(" "), stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_pod_list(json: &str) -> Result<Vec<PodPhase>> {
    let parsed: Value = serde_json::from_str(json).context("Invalid kubectl JSON output")?;

    let mut pods = Vec::new();
    if let Some(items) = parsed["items"].as_array() {
        for item in items {
            let name = item["metadata"]["name"].as_str().unwrap_or("unknown");
            let phase = item["status"]["phase"].as_str().unwrap_or("Unknown");
            pods.push(PodPhase {
                name: name.to_string(),
                phase: phase.to_string(),
            });
        }
    }
    Ok(pods)
}

fn parse_wsrep_status(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("wsrep_cluster_status"))
        .and_then(|line| line.split_whitespace().last())
        .map(str::to_string)
}

fn parse_top_output(output: &str) -> Vec<PodUsage> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let cpu = parts.next()?;
            let memory = parts.next()?;
            Some(PodUsage {
                name: name.to_string(),
                cpu: cpu.to_string(),
                memory: memory.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pod_list() {
        let json = r#"{
            "items": [
                {"metadata": {"name": "openfga-abc"}, "status": {"phase": "Running"}},
                {"metadata": {"name": "mariadb-galera-0"}, "status": {"phase": "Pending"}}
            ]
        }"#;
        let pods = parse_pod_list(json).unwrap();
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[0].name, "openfga-abc");
        assert_eq!(pods[1].phase, "Pending");
    }

    #[test]
    fn test_parse_wsrep_status() {
        let output = "Variable_name\tValue\nwsrep_cluster_status\tPrimary\n";
        assert_eq!(parse_wsrep_status(output), Some("Primary".to_string()));
        assert_eq!(parse_wsrep_status("no such variable"), None);
    }

    #[test]
    fn test_parse_top_output() {
        let output = "openfga-abc   812m   390Mi\nmariadb-galera-0   1150m   3024Mi\n";
        let usage = parse_top_output(output);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].cpu, "812m");
        assert_eq!(usage[1].memory, "3024Mi");
    }
}
