//! Error types for request validation and model scoring

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::types::response::ErrorResponse;

/// Message returned when the membership year precedes the group's creation year.
pub const YEAR_ORDER_MESSAGE: &str =
    "User joined year cannot be earlier than Ikimina created year.";

/// Coarse classification of validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingField,
    InvalidValue,
}

/// Input rejected before it reaches the estimator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{}", YEAR_ORDER_MESSAGE)]
    JoinedBeforeCreated {
        /// Name of the joined-year field in the active profile
        field: String,
        joined: i64,
        created: i64,
    },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        ValidationError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::MissingField { .. } => ValidationErrorKind::MissingField,
            _ => ValidationErrorKind::InvalidValue,
        }
    }

    /// Field the error is attributed to, used for per-field rejection counts.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field } => field,
            ValidationError::InvalidValue { field, .. } => field,
            ValidationError::JoinedBeforeCreated { field, .. } => field,
            ValidationError::InvalidBody(_) => "body",
        }
    }
}

/// Failure at the estimator call boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("feature vector has {actual} slots but the estimator expects {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("estimator failed: {0}")]
    Estimator(String),

    #[error("estimator panicked")]
    Panicked,

    #[error("estimator returned a non-finite value ({0})")]
    NonFinite(f64),
}

impl ScoringError {
    /// Short detail safe to return to callers.
    pub fn public_detail(&self) -> &'static str {
        match self {
            ScoringError::WidthMismatch { .. } => "feature contract does not match the loaded model",
            ScoringError::Estimator(_) | ScoringError::Panicked => "model scoring failed",
            ScoringError::NonFinite(_) => "model returned an invalid prediction",
        }
    }
}

/// Any failure of the prediction endpoint
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text of the error response
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::Validation(e) => e.to_string(),
            GatewayError::Scoring(e) => format!("Server error: {}", e.public_detail()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
