//! HTTP surface of the scoring gateway

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::contract::FeatureBuilder;
use crate::error::{GatewayError, ValidationError};
use crate::metrics::{GatewayMetrics, MetricsSnapshot};
use crate::models::ScoringEngine;
use crate::types::{PredictionResponse, RawApplicationInput};

/// Liveness text served on `/`
pub const LIVENESS_MESSAGE: &str = "✅ Loan Prediction Model API is running.";

/// Shared application state
pub struct AppState {
    pub builder: FeatureBuilder,
    pub engine: ScoringEngine,
    pub metrics: Arc<GatewayMetrics>,
    /// Suffix of the prediction message
    pub currency: String,
}

impl AppState {
    pub fn new(builder: FeatureBuilder, engine: ScoringEngine, currency: impl Into<String>) -> Self {
        Self {
            builder,
            engine,
            metrics: Arc::new(GatewayMetrics::new()),
            currency: currency.into(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Body of `GET /contract`
#[derive(Debug, Serialize)]
pub struct ContractResponse {
    pub profile: &'static str,
    pub route: &'static str,
    pub model: String,
    pub required_fields: Vec<&'static str>,
    pub features: Vec<&'static str>,
}

/// Build the router for the active profile
pub fn create_router(state: Arc<AppState>) -> Router {
    let route = state.builder.profile().route;

    Router::new()
        .route("/", get(health))
        .route(route, post(predict))
        .route("/contract", get(contract))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: Arc<AppState>, bind_address: &str) -> Result<()> {
    let profile = state.builder.profile();
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!(
        address = %bind_address,
        profile = %profile.name,
        route = %profile.route,
        "Scoring gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health() -> &'static str {
    LIVENESS_MESSAGE
}

async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, GatewayError> {
    let request_id = Uuid::new_v4();
    let profile = state.builder.profile().name;
    let start_time = Instant::now();
    state.metrics.record_request();

    let features = match RawApplicationInput::from_slice(&body)
        .and_then(|raw| state.builder.build(&raw))
    {
        Ok(features) => features,
        Err(e) => return Err(reject(&state, request_id, e)),
    };

    debug!(
        request_id = %request_id,
        features = ?features.as_slice(),
        "Scoring application"
    );

    let prediction = match state.engine.score(&features) {
        Ok(prediction) => prediction,
        Err(e) => {
            state.metrics.record_scoring_failure(start_time.elapsed());
            warn!(
                request_id = %request_id,
                profile = %profile,
                model = %state.engine.model_name(),
                error = %e,
                "Scoring failed"
            );
            return Err(e.into());
        }
    };

    let response = PredictionResponse::from_prediction(prediction, &state.currency);
    let processing_time = start_time.elapsed();
    state
        .metrics
        .record_prediction(processing_time, response.allowed_loan);

    info!(
        request_id = %request_id,
        profile = %profile,
        allowed_loan = response.allowed_loan,
        processing_time_us = processing_time.as_micros() as u64,
        "Prediction served"
    );

    Ok(Json(response))
}

fn reject(state: &AppState, request_id: Uuid, error: ValidationError) -> GatewayError {
    state.metrics.record_validation_failure(&error);
    info!(
        request_id = %request_id,
        profile = %state.builder.profile().name,
        field = %error.field(),
        kind = ?error.kind(),
        error = %error,
        "Application rejected"
    );
    error.into()
}

async fn contract(State(state): State<Arc<AppState>>) -> Json<ContractResponse> {
    let profile = state.builder.profile();
    Json(ContractResponse {
        profile: profile.name.as_str(),
        route: profile.route,
        model: state.engine.model_name().to_string(),
        required_fields: profile.required_fields(),
        features: profile.feature_names(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
