//! Loan Scoring Gateway - Main Entry Point
//!
//! Loads the configured feature contract and estimator, then serves
//! loan amount predictions over HTTP.

use anyhow::{Context, Result};
use loan_scoring_gateway::{
    config::{AppConfig, LoggingConfig},
    contract::{profile, FeatureBuilder},
    metrics::{GatewayMetrics, MetricsReporter},
    models::{ModelLoader, ScoringEngine},
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;
    info!("Starting Loan Scoring Gateway");
    info!(
        profile = %config.contract.profile,
        backend = ?config.model.backend,
        model_path = %config.model.path,
        "Configuration loaded successfully"
    );

    // Resolve the feature contract
    let builder = FeatureBuilder::new(profile(config.contract.profile));
    info!(
        "Feature contract {} initialized ({} features, route {})",
        config.contract.profile,
        builder.feature_count(),
        builder.profile().route
    );

    // Load the estimator and make sure it agrees with the contract
    let loader = ModelLoader::with_threads(config.model.onnx_threads)?;
    let estimator = loader.load(&config.model, &builder.feature_names())?;
    let engine = ScoringEngine::new(estimator);
    engine
        .check_contract(builder.feature_count())
        .context("Estimator does not match the configured feature contract")?;

    // Initialize metrics
    let metrics = Arc::new(GatewayMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = Arc::new(
        AppState::new(builder, engine, config.contract.currency.clone())
            .with_metrics(metrics.clone()),
    );

    server::serve(state, &config.server.bind_address()).await?;

    // Print final summary
    info!("Gateway shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    // RUST_LOG overrides the configured level
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.is_json() {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
    Ok(())
}
