//! Weighted-sum estimator loaded from JSON

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::models::Estimator;

/// On-disk form of a linear model
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModelFile {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub intercept: f64,
    /// Weight per feature slot name
    pub weights: HashMap<String, f64>,
}

fn default_name() -> String {
    "linear".to_string()
}

/// Intercept plus one weight per feature slot.
///
/// Weights are bound to slot positions when the model is loaded, so a
/// weight file written for a different contract fails at startup instead
/// of scoring silently against the wrong columns.
#[derive(Debug, Clone)]
pub struct LinearEstimator {
    name: String,
    intercept: f64,
    /// Weights in slot order
    weights: Vec<f64>,
}

impl LinearEstimator {
    /// Bind a model to the given slot order. Slots without a weight count 0.
    pub fn new(model: LinearModelFile, feature_names: &[&str]) -> Result<Self> {
        if let Some(unknown) = model
            .weights
            .keys()
            .find(|k| !feature_names.contains(&k.as_str()))
        {
            bail!(
                "Linear model '{}' has a weight for unknown feature '{}'",
                model.name,
                unknown
            );
        }

        let weights = feature_names
            .iter()
            .map(|name| model.weights.get(*name).copied().unwrap_or(0.0))
            .collect();

        Ok(Self {
            name: model.name,
            intercept: model.intercept,
            weights,
        })
    }

    /// Load a JSON weight file
    pub fn from_file<P: AsRef<Path>>(path: P, feature_names: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read linear model {}", path.display()))?;
        let model: LinearModelFile = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse linear model {}", path.display()))?;
        Self::new(model, feature_names)
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl Estimator for LinearEstimator {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected_features(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn predict(&self, features: &[f32]) -> Result<f64> {
        if features.len() != self.weights.len() {
            bail!(
                "expected {} features, got {}",
                self.weights.len(),
                features.len()
            );
        }

        let weighted_sum: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, &x)| w * x as f64)
            .sum();

        Ok(self.intercept + weighted_sum)
    }
}
