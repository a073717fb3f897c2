//! Estimator interface and implementations

pub mod inference;
pub mod linear;
pub mod loader;
pub mod onnx;

pub use inference::ScoringEngine;
pub use linear::LinearEstimator;
pub use loader::ModelLoader;
pub use onnx::OnnxEstimator;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A previously trained regression model.
///
/// Implementations are loaded once and shared read-only across request
/// handlers.
pub trait Estimator: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Input width the model was trained with, when known
    fn expected_features(&self) -> Option<usize> {
        None
    }

    /// Predict the allowed loan amount for one feature vector
    fn predict(&self, features: &[f32]) -> anyhow::Result<f64>;
}

/// Lock a model's mutable state, recovering it after a panic in a previous
/// call. A panicking run leaves no partial state behind in the session.
pub(crate) fn lock_model<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
