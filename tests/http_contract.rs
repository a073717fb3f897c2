//! End-to-end tests of the HTTP contract with a deterministic estimator

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use loan_scoring_gateway::contract::{profile, FeatureBuilder, ProfileName};
use loan_scoring_gateway::error::YEAR_ORDER_MESSAGE;
use loan_scoring_gateway::server::{create_router, AppState, LIVENESS_MESSAGE};
use loan_scoring_gateway::{Estimator, ScoringEngine};

/// Returns a fixed amount, or fails when `fail` is set
struct StubEstimator {
    amount: f64,
    fail: bool,
}

impl Estimator for StubEstimator {
    fn name(&self) -> &str {
        "stub"
    }

    fn predict(&self, _features: &[f32]) -> anyhow::Result<f64> {
        if self.fail {
            anyhow::bail!("tensor shape rejected");
        }
        Ok(self.amount)
    }
}

fn app_with(profile_name: ProfileName, estimator: StubEstimator) -> Router {
    let builder = FeatureBuilder::new(profile(profile_name));
    let engine = ScoringEngine::new(Arc::new(estimator));
    create_router(Arc::new(AppState::new(builder, engine, "RWF")))
}

fn app() -> Router {
    app_with(
        ProfileName::LabelledV1,
        StubEstimator {
            amount: 123456.789,
            fail: false,
        },
    )
}

fn labelled_application() -> Value {
    json!({
        "saving_times_per_period": 2,
        "completed_saving_cycles": 40,
        "user_savings_made": 38,
        "total_current_saving": 150000,
        "ikimina_created_year": 2019,
        "user_joined_year": 2020,
        "user_age": 34,
        "has_guardian": false,
        "employment_status": "employed",
        "saving_frequency": "weekly",
        "recent_loan_payment_status": "Good"
    })
}

async fn post(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    post(app, uri, body.to_string()).await
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_valid_application_is_scored() {
    let (status, body) = post_json(app(), "/predict-loan", &labelled_application()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed_loan"], json!(123456.79));
    assert_eq!(
        body["message"],
        json!("✅ Predicted allowed loan: 123,456.79 RWF")
    );
}

#[tokio::test]
async fn test_each_missing_field_is_named() {
    let required = profile(ProfileName::LabelledV1).required_fields();
    assert_eq!(required.len(), 11);

    for field in required {
        let mut application = labelled_application();
        application.as_object_mut().unwrap().remove(field);

        let (status, body) = post_json(app(), "/predict-loan", &application).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "field {}", field);
        assert_eq!(body["error"], json!(format!("Missing field: {}", field)));
    }
}

#[tokio::test]
async fn test_joined_before_created_is_rejected() {
    let mut application = labelled_application();
    application["user_joined_year"] = json!(2018);

    let (status, body) = post_json(app(), "/predict-loan", &application).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!(YEAR_ORDER_MESSAGE));
}

#[tokio::test]
async fn test_negative_value_names_the_field() {
    let mut application = labelled_application();
    application["total_current_saving"] = json!(-10);

    let (status, body) = post_json(app(), "/predict-loan", &application).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("total_current_saving"));
}

#[tokio::test]
async fn test_malformed_body_is_a_client_error() {
    let (status, body) = post(app(), "/predict-loan", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

    let (status, _) = post(app(), "/predict-loan", "[1, 2, 3]".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_estimator_failure_is_a_server_error() {
    let app = app_with(
        ProfileName::LabelledV1,
        StubEstimator {
            amount: 0.0,
            fail: true,
        },
    );

    let (status, body) = post_json(app, "/predict-loan", &labelled_application()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Server error: model scoring failed"));
}

#[tokio::test]
async fn test_unrepresentable_input_is_a_client_error() {
    let mut application = labelled_application();
    application["total_current_saving"] = json!(1e39);

    let (status, body) = post_json(app(), "/predict-loan", &application).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Invalid value for total_current_saving: out of range")
    );
}

#[tokio::test]
async fn test_prediction_too_large_to_round_is_a_server_error() {
    let app = app_with(
        ProfileName::LabelledV1,
        StubEstimator {
            amount: 1e307,
            fail: false,
        },
    );

    let (status, body) = post_json(app, "/predict-loan", &labelled_application()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        json!("Server error: model returned an invalid prediction")
    );
}

#[tokio::test]
async fn test_year_rule_on_pre_encoded_names_its_field() {
    let app = app_with(
        ProfileName::PreEncoded,
        StubEstimator {
            amount: 5000.0,
            fail: false,
        },
    );
    let mut application = pre_encoded_application();
    application["UserJoinedYear"] = json!(2019);

    let (status, body) = post_json(app.clone(), "/predict", &application).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!(YEAR_ORDER_MESSAGE));

    let (_, body) = get(app, "/metrics").await;
    let metrics: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(metrics["rejections_by_field"]["UserJoinedYear"], json!(1));
}

#[tokio::test]
async fn test_pre_encoded_route() {
    let app = app_with(
        ProfileName::PreEncoded,
        StubEstimator {
            amount: 5000.0,
            fail: false,
        },
    );
    let application = pre_encoded_application();

    let (status, body) = post_json(app.clone(), "/predict", &application).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed_loan"], json!(5000.0));

    // Only the active profile's route is served
    let (status, _) = get(app, "/predict-loan").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn pre_encoded_application() -> Value {
    json!({
        "SavingTimesPerPeriod": 1,
        "TotalSavingCycles": 12,
        "CompletedSavingCycles": 6,
        "UserSavingsMade": 6,
        "TotalCurrentSaving": 30000,
        "IkiminaCreatedYear": 2020,
        "UserJoinedYear": 2021,
        "Age": 27,
        "HasGuardian": 0,
        "IsEmployed": 1,
        "SavingFrequency_daily": 0,
        "SavingFrequency_monthly": 1,
        "SavingFrequency_weekly": 0,
        "RecentLoanPaymentStatus_Bad": 0,
        "RecentLoanPaymentStatus_Better": 0,
        "RecentLoanPaymentStatus_Excellent": 0,
        "RecentLoanPaymentStatus_Good": 1,
        "RecentLoanPaymentStatus_Poor": 0
    })
}

#[tokio::test]
async fn test_liveness() {
    let (status, body) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), LIVENESS_MESSAGE);
}

#[tokio::test]
async fn test_contract_introspection() {
    let (status, body) = get(app(), "/contract").await;
    assert_eq!(status, StatusCode::OK);

    let contract: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(contract["profile"], json!("labelled_v1"));
    assert_eq!(contract["route"], json!("/predict-loan"));
    assert_eq!(contract["model"], json!("stub"));
    assert_eq!(contract["features"].as_array().unwrap().len(), 18);
    assert_eq!(contract["features"][1], json!("TotalSavingCycles"));
}

#[tokio::test]
async fn test_metrics_count_outcomes() {
    let app = app();
    let mut invalid = labelled_application();
    invalid["user_age"] = Value::Null;

    post_json(app.clone(), "/predict-loan", &labelled_application()).await;
    post_json(app.clone(), "/predict-loan", &invalid).await;

    let (status, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let metrics: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(metrics["requests_received"], json!(2));
    assert_eq!(metrics["predictions_served"], json!(1));
    assert_eq!(metrics["validation_failures"], json!(1));
    assert_eq!(metrics["rejections_by_field"]["user_age"], json!(1));
}
