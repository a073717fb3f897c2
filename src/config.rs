//! Configuration management for the scoring gateway

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::contract::ProfileName;

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "LOAN_GATEWAY_CONFIG";

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Kind of persisted estimator
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorBackend {
    /// Regression model exported to ONNX
    #[default]
    Onnx,
    /// Intercept and per-feature weights in JSON
    Linear,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub contract: ContractConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Active feature contract
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Deployment profile: labelled_v1, coded_v2, backend_v3 or pre_encoded
    pub profile: ProfileName,
    /// Currency suffix of the response message
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "RWF".to_string()
}

/// Estimator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub backend: EstimatorBackend,
    /// Path of the model file
    pub path: String,
    /// Model name used in logs
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_model_name() -> String {
    "loan_amount".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Periodic metrics summary
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between summaries; 0 disables them
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from `LOAN_GATEWAY_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// Variables such as `LOAN_GATEWAY__SERVER__PORT=8080` override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("LOAN_GATEWAY").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
            contract: ContractConfig {
                profile: ProfileName::LabelledV1,
                currency: default_currency(),
            },
            model: ModelConfig {
                backend: EstimatorBackend::Linear,
                path: "models/loan_amount_linear.json".to_string(),
                name: "loan_amount_linear".to_string(),
                onnx_threads: 1,
            },
            metrics: MetricsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:5001");
        assert_eq!(config.contract.profile, ProfileName::LabelledV1);
        assert_eq!(config.contract.currency, "RWF");
        assert_eq!(config.model.backend, EstimatorBackend::Linear);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[contract]
profile = "backend_v3"

[model]
backend = "linear"
path = "models/linear.json"

[logging]
level = "debug"
format = "pretty"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.contract.profile, ProfileName::BackendV3);
        assert_eq!(config.contract.currency, "RWF");
        assert_eq!(config.model.backend, EstimatorBackend::Linear);
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.metrics.report_interval_secs, 60);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_unknown_profile_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[contract]
profile = "v9"

[model]
path = "m.onnx"

[logging]
level = "info"
format = "json"
"#,
        )
        .unwrap();

        assert!(AppConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.contract.profile, ProfileName::LabelledV1);
        assert_eq!(config.model.path, AppConfig::default().model.path);

        // The shipped model file must exist so the default config can start
        let model = Path::new(env!("CARGO_MANIFEST_DIR")).join(&config.model.path);
        assert!(model.is_file(), "{}", model.display());
    }
}
