//! Estimator loading

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{EstimatorBackend, ModelConfig};
use crate::models::{Estimator, LinearEstimator, OnnxEstimator};

/// Loader for persisted estimators
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        // Initialize ONNX Runtime
        ort::init().commit().context("Failed to initialize ONNX Runtime")?;
        let onnx_threads = onnx_threads.max(1);
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the configured estimator, bound to the given slot order
    pub fn load(&self, config: &ModelConfig, feature_names: &[&str]) -> Result<Arc<dyn Estimator>> {
        let estimator: Arc<dyn Estimator> = match config.backend {
            EstimatorBackend::Onnx => Arc::new(self.load_onnx(&config.path, &config.name)?),
            EstimatorBackend::Linear => Arc::new(self.load_linear(&config.path, feature_names)?),
        };

        info!(
            model = %estimator.name(),
            backend = ?config.backend,
            path = %config.path,
            "Estimator loaded"
        );

        Ok(estimator)
    }

    /// Load a single ONNX model from file
    pub fn load_onnx<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<OnnxEstimator> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let estimator = OnnxEstimator::new(name, session);

        info!(
            model = %name,
            input = %estimator.input_name(),
            output = %estimator.output_name(),
            expected_features = ?estimator.expected_features(),
            "Model loaded successfully"
        );

        Ok(estimator)
    }

    /// Load a linear model from a JSON weight file
    pub fn load_linear<P: AsRef<Path>>(&self, path: P, feature_names: &[&str]) -> Result<LinearEstimator> {
        let path = path.as_ref();
        info!(path = %path.display(), features = feature_names.len(), "Loading linear model");
        let estimator = LinearEstimator::from_file(path, feature_names)?;
        info!(
            model = %estimator.name(),
            intercept = estimator.intercept(),
            "Model loaded successfully"
        );
        Ok(estimator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_linear_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, r#"{"intercept": 10.0, "weights": {"Age": 1.0}}"#).unwrap();

        let config = ModelConfig {
            backend: EstimatorBackend::Linear,
            path: path.display().to_string(),
            name: "loan_model".to_string(),
            onnx_threads: 1,
        };

        let estimator = ModelLoader::new().unwrap().load(&config, &["Age", "HasGuardian"]).unwrap();
        assert_eq!(estimator.expected_features(), Some(2));
        assert_eq!(estimator.predict(&[30.0, 0.0]).unwrap(), 40.0);
    }

    #[test]
    fn test_missing_model_file() {
        let loader = ModelLoader::new().unwrap();
        assert!(loader.load_linear("does/not/exist.json", &["Age"]).is_err());
    }
}
