//! OpenFGA + MariaDB Galera capacity CLI
//!
//! A command-line tool for sizing connection pools and resources from a
//! target request rate, checking deployment manifests against the
//! high-RPS baseline, and watching live capacity via Prometheus.

mod commands;
mod config;
mod kube;
mod manifest;
mod output;
mod prometheus;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, monitor, plan, status};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// OpenFGA + MariaDB Galera capacity CLI
#[derive(Parser)]
#[command(name = "fgacap")]
#[command(author, version, about = "Capacity planning and health checks for OpenFGA on MariaDB Galera", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute pool sizing and resource recommendations for a target RPS
    Plan {
        /// Use a named scenario preset (small, medium, large, xlarge)
        #[arg(long, conflicts_with_all = ["rps", "latency_ms", "safety_factor", "replicas"])]
        preset: Option<String>,

        /// Target request rate in requests per second
        #[arg(long, default_value_t = 10_000)]
        rps: u32,

        /// Average per-request latency in milliseconds
        #[arg(long, default_value_t = 50)]
        latency_ms: u32,

        /// Safety factor applied to the raw connection estimate
        #[arg(long, default_value_t = 1.5)]
        safety_factor: f64,

        /// OpenFGA pod replica count
        #[arg(long, default_value_t = 8)]
        replicas: u32,

        /// Galera cluster node count
        #[arg(long, default_value_t = 3)]
        galera_nodes: u32,

        /// Spare-capacity fraction for the Galera connection ceiling
        #[arg(long, default_value_t = 0.2)]
        buffer: f64,

        /// Also print the OPENFGA_DATASTORE_* environment fragment
        #[arg(long)]
        emit_env: bool,
    },

    /// Evaluate deployment manifests against the high-RPS baseline
    Check {
        /// Path to a (multi-document) Kubernetes YAML file
        file: PathBuf,

        /// Expected Galera cluster node count
        #[arg(long, default_value_t = 3)]
        galera_nodes: u32,
    },

    /// Watch per-pod request rate and capacity usage via Prometheus
    Monitor {
        /// Prometheus base URL
        #[arg(long, env = "FGACAP_PROMETHEUS_URL")]
        prometheus_url: Option<String>,

        /// Kubernetes namespace
        #[arg(long, short, env = "FGACAP_NAMESPACE")]
        namespace: Option<String>,

        /// Theoretical maximum RPS one pod can sustain
        #[arg(long, default_value_t = 2000)]
        capacity_per_pod: u32,

        /// Refresh interval in seconds (with --watch)
        #[arg(long, default_value_t = 5)]
        interval: u64,

        /// Refresh continuously instead of reporting once
        #[arg(long, short)]
        watch: bool,
    },

    /// Check deployment readiness via kubectl
    Status {
        /// Kubernetes namespace
        #[arg(long, short, env = "FGACAP_NAMESPACE")]
        namespace: Option<String>,

        /// Expected Galera cluster node count
        #[arg(long, default_value_t = 3)]
        galera_nodes: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let file_config = config::Config::load().unwrap_or_default();

    match cli.command {
        Commands::Plan {
            preset,
            rps,
            latency_ms,
            safety_factor,
            replicas,
            galera_nodes,
            buffer,
            emit_env,
        } => {
            let scenario = plan::resolve_scenario(preset.as_deref(), rps, latency_ms, safety_factor, replicas)?;
            plan::run(&scenario, galera_nodes, buffer, emit_env, cli.format)?;
        }
        Commands::Check { file, galera_nodes } => {
            check::run(&file, galera_nodes, cli.format)?;
        }
        Commands::Monitor {
            prometheus_url,
            namespace,
            capacity_per_pod,
            interval,
            watch,
        } => {
            let url = file_config.prometheus_url(prometheus_url.as_deref());
            let namespace = file_config.namespace(namespace.as_deref());
            let client = prometheus::PromClient::new(&url)?;
            monitor::run(&client, &namespace, capacity_per_pod, interval, watch, cli.format).await?;
        }
        Commands::Status {
            namespace,
            galera_nodes,
        } => {
            let namespace = file_config.namespace(namespace.as_deref());
            status::run(&namespace, galera_nodes, cli.format).await?;
        }
    }

    Ok(())
}
