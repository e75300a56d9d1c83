use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{
    AnalysisRecord, SymptomAnalysis, SymptomAnalysisRequest, TriageError, UrgencyLevel,
    UrgentTriageAlert,
};
use crate::services::alerts::NotificationDispatcher;
use crate::services::engine::TriageEngine;
use crate::services::knowledge::loader_from_config;
use crate::services::store::{AnalysisStore, SupabaseAnalysisStore};

/// Runs the engine, then hands the result to the store and the dispatcher.
/// Neither collaborator can change or fail the returned analysis.
pub struct TriageService {
    engine: TriageEngine,
    store: Option<Arc<dyn AnalysisStore>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    alert_min_urgency: UrgencyLevel,
}

impl TriageService {
    pub fn new(
        engine: TriageEngine,
        store: Option<Arc<dyn AnalysisStore>>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        alert_min_urgency: UrgencyLevel,
    ) -> Self {
        Self {
            engine,
            store,
            dispatcher,
            alert_min_urgency,
        }
    }

    /// Loads the knowledge base and wires the Supabase store when configured.
    pub fn from_config(config: &AppConfig, dispatcher: Arc<dyn NotificationDispatcher>) -> Result<Self> {
        let knowledge_base = loader_from_config(config).load()?;
        let engine = TriageEngine::new(Arc::new(knowledge_base));

        let store: Option<Arc<dyn AnalysisStore>> = if config.should_persist_analyses() {
            Some(Arc::new(SupabaseAnalysisStore::new(config)))
        } else {
            None
        };

        let alert_min_urgency = UrgencyLevel::parse(&config.triage_alert_min_urgency)
            .unwrap_or_else(|| {
                warn!(
                    "Unknown TRIAGE_ALERT_MIN_URGENCY '{}', alerting on high urgency only",
                    config.triage_alert_min_urgency
                );
                UrgencyLevel::High
            });

        Ok(Self::new(engine, store, dispatcher, alert_min_urgency))
    }

    pub fn engine(&self) -> &TriageEngine {
        &self.engine
    }

    #[instrument(skip(self, request), fields(patient_id = ?request.patient_id))]
    pub async fn analyze(&self, request: &SymptomAnalysisRequest) -> Result<SymptomAnalysis, TriageError> {
        let report = request.to_report();
        let result = self.engine.analyze_symptoms(&report)?;

        let analysis = SymptomAnalysis {
            analysis_id: Uuid::new_v4(),
            patient_id: request.patient_id.clone(),
            analysis_timestamp: Utc::now(),
            result,
        };

        info!(
            analysis_id = %analysis.analysis_id,
            emergency_level = %analysis.result.emergency_level,
            urgency_score = analysis.result.urgency_score,
            confidence = analysis.result.confidence,
            specialties = ?analysis.result.recommended_specialties,
            "Symptom analysis completed"
        );

        self.persist(&analysis);

        if analysis.result.emergency_level >= self.alert_min_urgency {
            let alert = UrgentTriageAlert::from_analysis(&analysis);
            if let Err(e) = self.dispatcher.dispatch(alert).await {
                error!("Failed to dispatch triage alert for {}: {}", analysis.analysis_id, e);
            }
        }

        Ok(analysis)
    }

    fn persist(&self, analysis: &SymptomAnalysis) {
        let Some(store) = self.store.clone() else {
            return;
        };

        let record = AnalysisRecord::from_analysis(analysis);
        tokio::spawn(async move {
            if let Err(e) = store.save_analysis(&record).await {
                warn!("Failed to persist analysis {}: {}", record.analysis_id, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use anyhow::anyhow;

    use crate::services::alerts::MockNotificationDispatcher;
    use crate::services::knowledge::{BuiltinKnowledgeBase, KnowledgeBaseLoader};
    use crate::services::store::MockAnalysisStore;

    fn engine() -> TriageEngine {
        TriageEngine::new(Arc::new(BuiltinKnowledgeBase.load().unwrap()))
    }

    fn request(symptoms: &[&str]) -> SymptomAnalysisRequest {
        SymptomAnalysisRequest {
            patient_id: Some("patient-42".to_string()),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_urgent_result_is_dispatched() {
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|alert| {
                alert.emergency_level == UrgencyLevel::High
                    && alert.patient_id.as_deref() == Some("patient-42")
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = TriageService::new(engine(), None, Arc::new(dispatcher), UrgencyLevel::High);
        let analysis = service
            .analyze(&request(&["chest pain", "shortness of breath", "sweating"]))
            .await
            .unwrap();

        assert_eq!(analysis.result.emergency_level, UrgencyLevel::High);
    }

    #[tokio::test]
    async fn test_low_urgency_is_not_dispatched() {
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher.expect_dispatch().times(0);

        let service = TriageService::new(engine(), None, Arc::new(dispatcher), UrgencyLevel::High);
        let analysis = service.analyze(&request(&["mild headache"])).await.unwrap();
        assert_eq!(analysis.result.emergency_level, UrgencyLevel::Low);
    }

    #[tokio::test]
    async fn test_dispatch_failure_does_not_fail_analysis() {
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher
            .expect_dispatch()
            .times(1)
            .returning(|_| Err(anyhow!("pager offline")));

        let service = TriageService::new(engine(), None, Arc::new(dispatcher), UrgencyLevel::Medium);
        let analysis = service.analyze(&request(&["high fever"])).await;
        assert!(analysis.is_ok());
    }

    #[tokio::test]
    async fn test_store_receives_record_and_failures_are_swallowed() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut store = MockAnalysisStore::new();
        store
            .expect_save_analysis()
            .times(1)
            .returning(move |record| {
                let _ = tx.send(record.analysis_id);
                Err(anyhow!("database unavailable"))
            });

        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher.expect_dispatch().times(0);

        let service = TriageService::new(
            engine(),
            Some(Arc::new(store)),
            Arc::new(dispatcher),
            UrgencyLevel::High,
        );
        let analysis = service.analyze(&request(&["cough"])).await.unwrap();

        let persisted = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(persisted, Some(analysis.analysis_id));
    }

    #[tokio::test]
    async fn test_invalid_input_skips_collaborators() {
        let mut store = MockAnalysisStore::new();
        store.expect_save_analysis().times(0);
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher.expect_dispatch().times(0);

        let service = TriageService::new(
            engine(),
            Some(Arc::new(store)),
            Arc::new(dispatcher),
            UrgencyLevel::Low,
        );
        let result = service.analyze(&request(&[])).await;
        assert!(matches!(result, Err(TriageError::InvalidInput(_))));
    }
}
