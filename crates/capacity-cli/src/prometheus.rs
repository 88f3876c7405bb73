//! Prometheus query client
//!
//! Thin wrapper over the instant-query HTTP API. The queries mirror the
//! dashboards used during load testing: per-pod gRPC rate and latency for
//! OpenFGA, `mysql_global_status_*` gauges for the Galera side.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// One instant-vector sample
#[derive(Debug, Clone)]
pub struct Sample {
    pub labels: HashMap<String, String>,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<VectorSample>,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    metric: HashMap<String, String>,
    /// `[timestamp, "value"]`
    value: (f64, String),
}

/// Client for the Prometheus HTTP API
pub struct PromClient {
    client: Client,
    base_url: Url,
}

impl PromClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid Prometheus URL")?;

        Ok(Self { client, base_url })
    }

    /// Check the `/-/healthy` endpoint
    pub async fn healthy(&self) -> bool {
        let Ok(url) = self.base_url.join("-/healthy") else {
            return false;
        };
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Run an instant query and return the vector result
    pub async fn query(&self, expr: &str) -> Result<Vec<Sample>> {
        let url = self
            .base_url
            .join("api/v1/query")
            .context("Invalid query path")?;

        debug!(query = expr, "querying Prometheus");

        let response = self
            .client
            .get(url)
            .query(&[("query", expr)])
            .send()
            .await
            .context("Failed to reach Prometheus")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Prometheus error ({}): {}", status, body);
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .context("Failed to parse Prometheus response")?;

        if parsed.status != "success" {
            anyhow::bail!("Prometheus query failed: status={}", parsed.status);
        }

        let samples = parsed
            .data
            .result
            .into_iter()
            .filter_map(|s| {
                s.value.1.parse::<f64>().ok().map(|value| Sample {
                    labels: s.metric,
                    value,
                })
            })
            .collect();

        Ok(samples)
    }

    /// Per-pod request rate for the OpenFGA gRPC service
    pub async fn pod_rps(&self, namespace: &str) -> Result<HashMap<String, f64>> {
        let expr = format!(
            r#"sum by(pod) (rate(grpc_server_handled_total{{namespace="{namespace}",grpc_service="openfga.v1.OpenFGAService"}}[1m]))"#
        );
        Ok(by_pod(self.query(&expr).await?))
    }

    /// Per-pod non-OK response ratio, as a percentage
    pub async fn pod_error_rate(&self, namespace: &str) -> Result<HashMap<String, f64>> {
        let expr = format!(
            r#"(sum by(pod) (rate(grpc_server_handled_total{{namespace="{namespace}",grpc_code!="OK"}}[1m])) / sum by(pod) (rate(grpc_server_handled_total{{namespace="{namespace}"}}[1m]))) * 100"#
        );
        Ok(by_pod(self.query(&expr).await?))
    }

    /// Per-pod latency quantile in milliseconds
    pub async fn pod_latency_ms(
        &self,
        namespace: &str,
        quantile: f64,
    ) -> Result<HashMap<String, f64>> {
        let expr = format!(
            r#"histogram_quantile({quantile}, sum by(pod, le) (rate(grpc_server_handling_seconds_bucket{{namespace="{namespace}",grpc_service="openfga.v1.OpenFGAService"}}[1m]))) * 1000"#
        );
        Ok(by_pod(self.query(&expr).await?))
    }

    /// Galera cluster size as reported by the mysqld exporter
    pub async fn galera_cluster_size(&self, namespace: &str) -> Result<Option<f64>> {
        self.scalar(&format!(
            r#"mysql_global_status_wsrep_cluster_size{{namespace="{namespace}"}}"#
        ))
        .await
    }

    /// Galera `wsrep_ready` gauge (1 when the node accepts queries)
    pub async fn galera_ready(&self, namespace: &str) -> Result<Option<f64>> {
        self.scalar(&format!(
            r#"mysql_global_status_wsrep_ready{{namespace="{namespace}"}}"#
        ))
        .await
    }

    /// Total connected threads across the database pods
    pub async fn threads_connected(&self, namespace: &str) -> Result<Option<f64>> {
        let samples = self
            .query(&format!(
                r#"mysql_global_status_threads_connected{{namespace="{namespace}"}}"#
            ))
            .await?;
        if samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(samples.iter().map(|s| s.value).sum()))
    }

    async fn scalar(&self, expr: &str) -> Result<Option<f64>> {
        let samples = self.query(expr).await?;
        Ok(samples.first().map(|s| s.value))
    }
}

fn by_pod(samples: Vec<Sample>) -> HashMap<String, f64> {
    samples
        .into_iter()
        .filter_map(|s| s.labels.get("pod").cloned().map(|pod| (pod, s.value)))
        .collect()
}
