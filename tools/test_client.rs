//! Test Application Client
//!
//! Posts randomly generated loan applications (`labelled_v1` shape) to a
//! running gateway and reports the outcome of each request.

use chrono::{Datelike, Utc};
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Application structure accepted by the `labelled_v1` contract
#[derive(Debug, Clone, Serialize)]
struct LoanApplication {
    saving_times_per_period: u32,
    completed_saving_cycles: u32,
    user_savings_made: u32,
    total_current_saving: f64,
    ikimina_created_year: i32,
    user_joined_year: i32,
    user_age: u32,
    has_guardian: bool,
    employment_status: String,
    saving_frequency: String,
    recent_loan_payment_status: String,
}

/// Application generator for testing
struct ApplicationGenerator {
    rng: rand::rngs::ThreadRng,
    current_year: i32,
}

impl ApplicationGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            current_year: Utc::now().year(),
        }
    }

    /// Generate an application the gateway should accept
    fn generate_valid(&mut self) -> LoanApplication {
        let created = self.rng.gen_range(2010..=self.current_year);
        let joined = self.rng.gen_range(created..=self.current_year);
        let frequency = self.random_choice(&["daily", "weekly", "monthly"]);
        let cycles = self.rng.gen_range(0..200);

        LoanApplication {
            saving_times_per_period: self.rng.gen_range(1..=4),
            completed_saving_cycles: cycles,
            user_savings_made: self.rng.gen_range(0..=cycles),
            total_current_saving: (self.rng.gen_range(0.0..2_000_000.0_f64) / 100.0).round() * 100.0,
            ikimina_created_year: created,
            user_joined_year: joined,
            user_age: self.rng.gen_range(16..75),
            has_guardian: self.rng.gen_bool(0.15),
            employment_status: self
                .random_choice(&["employed", "unemployed", "self-employed", "student"])
                .to_string(),
            saving_frequency: frequency.to_string(),
            recent_loan_payment_status: self
                .random_choice(&["Poor", "Bad", "Good", "Better", "Excellent"])
                .to_string(),
        }
    }

    /// Generate an application the gateway should reject
    fn generate_invalid(&mut self) -> serde_json::Value {
        let mut application = self.generate_valid();
        match self.rng.gen_range(0..3) {
            0 => {
                // Joined before the group existed
                application.user_joined_year = application.ikimina_created_year - 1;
                serde_json::to_value(application).unwrap_or_default()
            }
            1 => {
                let mut value = serde_json::to_value(application).unwrap_or_default();
                if let Some(fields) = value.as_object_mut() {
                    fields.remove("user_age");
                }
                value
            }
            _ => {
                let mut value = serde_json::to_value(application).unwrap_or_default();
                value["total_current_saving"] = serde_json::json!(-500.0);
                value
            }
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Application Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/'))
        .unwrap_or("http://localhost:5001");
    let route = args.get(2).map(|s| s.as_str()).unwrap_or("/predict-loan");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let invalid_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        route = %route,
        count = count,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // Check the gateway is up
    match client.get(format!("{}/", base_url)).send().await {
        Ok(response) => info!(status = %response.status(), "Gateway reachable"),
        Err(e) => {
            warn!(error = %e, "Gateway unreachable. Running in dry-run mode.");
            return run_dry_mode(count, invalid_rate, delay_ms).await;
        }
    }

    let url = format!("{}{}", base_url, route);
    let mut generator = ApplicationGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to send {} applications...", count);

    let mut accepted = 0;
    let mut rejected = 0;
    let mut failed = 0;

    for i in 0..count {
        let payload = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            serde_json::to_value(generator.generate_valid())?
        };

        match client.post(&url).json(&payload).send().await {
            Ok(response) => {
                let status = response.status();
                let body: serde_json::Value = response.json().await.unwrap_or_default();
                if status.is_success() {
                    accepted += 1;
                    info!(allowed_loan = %body["allowed_loan"], "{}", body["message"]);
                } else if status.is_client_error() {
                    rejected += 1;
                    info!(status = %status, "Rejected: {}", body["error"]);
                } else {
                    failed += 1;
                    warn!(status = %status, "Server error: {}", body["error"]);
                }
            }
            Err(e) => {
                failed += 1;
                warn!(error = %e, "Request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} applications ({} accepted, {} rejected, {} failed)",
                i + 1,
                count,
                accepted,
                rejected,
                failed
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} applications ({} accepted, {} rejected, {} failed)",
        count, accepted, rejected, failed
    );

    Ok(())
}

async fn run_dry_mode(count: u64, invalid_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no gateway connection)");

    let mut generator = ApplicationGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let payload = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            serde_json::to_value(generator.generate_valid())?
        };

        let json = serde_json::to_string_pretty(&payload)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample application {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
