use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{
    acknowledge_alert, analyze_symptoms, get_active_alerts, get_common_symptoms, TriageHandlers,
};

pub fn create_triage_router(handlers: Arc<TriageHandlers>) -> Router {
    Router::new()
        .route("/analyze", post(analyze_symptoms))
        .route("/common-symptoms", get(get_common_symptoms))
        .route("/alerts", get(get_active_alerts))
        .route("/alerts/{alert_id}/acknowledge", post(acknowledge_alert))
        .with_state(handlers)
}
