//! Scoring call boundary

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::contract::FeatureVector;
use crate::error::ScoringError;
use crate::models::Estimator;
use crate::types::response::round_to_cents;

/// Wraps the loaded estimator and turns every failure mode of the opaque
/// call into a [`ScoringError`].
#[derive(Clone)]
pub struct ScoringEngine {
    estimator: Arc<dyn Estimator>,
}

impl ScoringEngine {
    pub fn new(estimator: Arc<dyn Estimator>) -> Self {
        info!(
            model = %estimator.name(),
            expected_features = ?estimator.expected_features(),
            "Scoring engine initialized"
        );
        Self { estimator }
    }

    pub fn model_name(&self) -> &str {
        self.estimator.name()
    }

    /// Fail fast when the estimator's input width disagrees with the contract
    pub fn check_contract(&self, feature_count: usize) -> Result<(), ScoringError> {
        match self.estimator.expected_features() {
            Some(expected) if expected != feature_count => Err(ScoringError::WidthMismatch {
                expected,
                actual: feature_count,
            }),
            _ => Ok(()),
        }
    }

    /// Run the estimator on a feature vector
    pub fn score(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        self.check_contract(features.len())?;

        let estimator = &self.estimator;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| estimator.predict(features.as_slice())));

        let prediction = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                error!(model = %estimator.name(), error = %e, "Estimator call failed");
                return Err(ScoringError::Estimator(e.to_string()));
            }
            Err(_) => {
                error!(model = %estimator.name(), "Estimator panicked");
                return Err(ScoringError::Panicked);
            }
        };

        // The response carries the amount rounded to cents, which must stay finite too
        if !prediction.is_finite() || !round_to_cents(prediction).is_finite() {
            error!(model = %estimator.name(), prediction, "Estimator returned a non-finite value");
            return Err(ScoringError::NonFinite(prediction));
        }

        debug!(model = %estimator.name(), prediction, "Scored feature vector");
        Ok(prediction)
    }
}
