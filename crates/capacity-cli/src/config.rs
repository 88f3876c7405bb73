//! Configuration file for CLI defaults
//!
//! Flags and environment variables always win; the file only supplies
//! defaults for values the user did not pass.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";
const DEFAULT_NAMESPACE: &str = "openfga-prod";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default Prometheus base URL
    pub prometheus_url: Option<String>,
    /// Default Kubernetes namespace
    pub default_namespace: Option<String>,
}

impl Config {
    /// Load configuration from file, falling back to empty defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Resolve the Prometheus URL: flag > config file > built-in default
    pub fn prometheus_url(&self, override_url: Option<&str>) -> String {
        override_url
            .map(str::to_string)
            .or_else(|| self.prometheus_url.clone())
            .unwrap_or_else(|| DEFAULT_PROMETHEUS_URL.to_string())
    }

    /// Resolve the namespace: flag > config file > built-in default
    pub fn namespace(&self, override_ns: Option<&str>) -> String {
        override_ns
            .map(str::to_string)
            .or_else(|| self.default_namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("fgacap").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let config = Config {
            prometheus_url: Some("http://prom.internal:9090".to_string()),
            default_namespace: None,
        };

        assert_eq!(
            config.prometheus_url(Some("http://localhost:9999")),
            "http://localhost:9999"
        );
        assert_eq!(config.prometheus_url(None), "http://prom.internal:9090");
        assert_eq!(config.namespace(None), DEFAULT_NAMESPACE);
    }
}
