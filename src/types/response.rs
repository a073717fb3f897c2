//! Response bodies of the prediction endpoint

use serde::{Deserialize, Serialize};

/// Successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted loan amount, rounded to two decimals
    pub allowed_loan: f64,

    /// Human-readable summary of the prediction
    pub message: String,
}

impl PredictionResponse {
    /// Build a response from a raw estimator output
    pub fn from_prediction(prediction: f64, currency: &str) -> Self {
        let allowed_loan = round_to_cents(prediction);
        Self {
            allowed_loan,
            message: format!(
                "✅ Predicted allowed loan: {} {}",
                format_amount(allowed_loan),
                currency
            ),
        }
    }
}

/// Error body for 4xx/5xx responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Round half away from zero to two decimal places
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format an amount with two decimals and comma thousands separators.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}
