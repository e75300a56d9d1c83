use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shared_utils::test_utils::{SampleRequests, TestConfig};
use triage_cell::handlers::TriageHandlers;
use triage_cell::router::create_triage_router;

fn create_test_app() -> (Router, Arc<TriageHandlers>) {
    let handlers = Arc::new(TriageHandlers::new(TestConfig::default().to_arc()).unwrap());
    let app = Router::new().nest("/triage", create_triage_router(handlers.clone()));
    (app, handlers)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_analyze_cardiac_emergency() {
    let (app, _) = create_test_app();
    let request = SampleRequests::cardiac_emergency();

    let (status, body) = send(&app, "POST", "/triage/analyze", Some(request.clone())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emergency_level"], "high");
    assert_eq!(body["patient_id"], request["patient_id"]);
    assert_eq!(body["recommended_specialties"][0], "Cardiology");
    assert_eq!(body["recommended_actions"][0]["action"], "Seek immediate emergency care");
    assert!(body["analysis_id"].is_string());
    assert!(body["analysis_timestamp"].is_string());
    assert!(body["disclaimer"].as_str().unwrap().contains("informational purposes"));
}

#[tokio::test]
async fn test_analyze_accepts_optional_fields() {
    let (app, _) = create_test_app();
    let request = json!({
        "symptoms": ["joint pain", "stiff joints"],
        "patient_age": 61,
        "patient_gender": "M",
        "medical_history": ["gout"],
        "severity": "moderate",
        "duration": "weeks"
    });

    let (status, body) = send(&app, "POST", "/triage/analyze", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emergency_level"], "low");
    assert!(body["patient_id"].is_null());
    assert_eq!(body["recommended_specialties"][0], "Rheumatology");
}

#[tokio::test]
async fn test_analyze_rejects_empty_symptoms() {
    let (app, _) = create_test_app();

    let (status, body) = send(&app, "POST", "/triage/analyze", Some(SampleRequests::empty_symptoms())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("symptoms"));
}

#[tokio::test]
async fn test_analyze_rejects_out_of_range_age() {
    let (app, _) = create_test_app();
    let request = json!({ "symptoms": ["fever"], "patient_age": 121 });

    let (status, body) = send(&app, "POST", "/triage/analyze", Some(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("patient_age"));
}

#[tokio::test]
async fn test_analyze_rejects_age_beyond_i32_with_json_error() {
    let (app, _) = create_test_app();
    let request = json!({ "symptoms": ["fever"], "patient_age": 5_000_000_000_i64 });

    let (status, body) = send(&app, "POST", "/triage/analyze", Some(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("patient_age"));
}

#[tokio::test]
async fn test_common_symptoms() {
    let (app, _) = create_test_app();

    let (status, body) = send(&app, "GET", "/triage/common-symptoms", None).await;

    assert_eq!(status, StatusCode::OK);
    let symptoms = body["symptoms"].as_array().unwrap();
    assert!(symptoms.contains(&json!("fever")));
    assert!(symptoms.contains(&json!("chest pain")));
}

#[tokio::test]
async fn test_urgent_analysis_raises_alert_until_acknowledged() {
    let (app, handlers) = create_test_app();

    let (status, _) = send(&app, "POST", "/triage/analyze", Some(SampleRequests::mild_headache())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(handlers.get_alert_dispatcher().active_count().await, 0);

    let (status, analysis) = send(&app, "POST", "/triage/analyze", Some(SampleRequests::cardiac_emergency())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, alerts) = send(&app, "GET", "/triage/alerts", None).await;
    assert_eq!(status, StatusCode::OK);
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["analysis_id"], analysis["analysis_id"]);
    assert_eq!(alerts[0]["emergency_level"], "high");

    let alert_id = alerts[0]["alert_id"].as_str().unwrap().to_string();
    let uri = format!("/triage/alerts/{}/acknowledge", alert_id);

    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acknowledged"], true);

    let (status, _) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, alerts) = send(&app, "GET", "/triage/alerts", None).await;
    assert!(alerts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_alert_registry_respects_configured_capacity() {
    let mut config = TestConfig::default();
    config.max_active_alerts = 2;
    let handlers = Arc::new(TriageHandlers::new(config.to_arc()).unwrap());
    let app = Router::new().nest("/triage", create_triage_router(handlers.clone()));

    for _ in 0..5 {
        let (status, _) = send(&app, "POST", "/triage/analyze", Some(SampleRequests::cardiac_emergency())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, alerts) = send(&app, "GET", "/triage/alerts", None).await;
    assert_eq!(alerts.as_array().unwrap().len(), 2);
    assert_eq!(handlers.get_alert_dispatcher().active_count().await, 2);
}
