// =====================================================================================
// TRIAGE CELL HANDLERS
// =====================================================================================

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{SymptomAnalysis, SymptomAnalysisRequest, UrgentTriageAlert};
use crate::services::{AlertLogDispatcher, TriageService};
use shared_config::AppConfig;
use shared_models::error::AppError;

pub struct TriageHandlers {
    service: Arc<TriageService>,
    alerts: Arc<AlertLogDispatcher>,
}

impl TriageHandlers {
    /// Fails when a configured knowledge-base file cannot be loaded.
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let alerts = Arc::new(AlertLogDispatcher::with_capacity(config.triage_max_active_alerts));
        let service = Arc::new(TriageService::from_config(&config, alerts.clone())?);

        Ok(Self { service, alerts })
    }

    pub fn with_components(service: Arc<TriageService>, alerts: Arc<AlertLogDispatcher>) -> Self {
        Self { service, alerts }
    }

    pub fn get_alert_dispatcher(&self) -> Arc<AlertLogDispatcher> {
        self.alerts.clone()
    }
}

#[instrument(skip(handlers, request))]
pub async fn analyze_symptoms(
    State(handlers): State<Arc<TriageHandlers>>,
    Json(request): Json<SymptomAnalysisRequest>,
) -> Result<Json<SymptomAnalysis>, AppError> {
    let analysis = handlers.service.analyze(&request).await?;
    Ok(Json(analysis))
}

#[instrument(skip(handlers))]
pub async fn get_common_symptoms(
    State(handlers): State<Arc<TriageHandlers>>,
) -> Json<Value> {
    let symptoms = &handlers.service.engine().knowledge_base().common_symptoms;
    Json(json!({ "symptoms": symptoms }))
}

#[instrument(skip(handlers))]
pub async fn get_active_alerts(
    State(handlers): State<Arc<TriageHandlers>>,
) -> Json<Vec<UrgentTriageAlert>> {
    Json(handlers.alerts.get_active_alerts().await)
}

#[instrument(skip(handlers))]
pub async fn acknowledge_alert(
    State(handlers): State<Arc<TriageHandlers>>,
    Path(alert_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !handlers.alerts.acknowledge_alert(&alert_id).await {
        return Err(AppError::NotFound(format!("Alert {} not found", alert_id)));
    }

    info!("Alert {} acknowledged", alert_id);
    Ok(Json(json!({
        "alert_id": alert_id,
        "acknowledged": true
    })))
}
