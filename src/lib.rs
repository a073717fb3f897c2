//! Loan Scoring Gateway Library
//!
//! Validates loan applications against a versioned feature contract,
//! encodes them into the estimator's slot order and serves the predicted
//! allowed loan amount over HTTP.

pub mod config;
pub mod contract;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use contract::{FeatureBuilder, FeatureVector, ProfileName};
pub use error::{GatewayError, ScoringError, ValidationError};
pub use models::{Estimator, ScoringEngine};
pub use server::{create_router, AppState};
pub use types::{PredictionResponse, RawApplicationInput};
