use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub persist_analyses: bool,
    pub alert_min_urgency: String,
    pub max_active_alerts: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            persist_analyses: false,
            alert_min_urgency: "high".to_string(),
            max_active_alerts: 1000,
        }
    }
}

impl TestConfig {
    /// Config pointing the analysis store at a mock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            persist_analyses: true,
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            triage_knowledge_base_path: None,
            triage_alert_min_urgency: self.alert_min_urgency.clone(),
            triage_persist_analyses: self.persist_analyses,
            triage_max_active_alerts: self.max_active_alerts,
            server_port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct SampleRequests;

impl SampleRequests {
    pub fn cardiac_emergency() -> serde_json::Value {
        json!({
            "patient_id": Uuid::new_v4().to_string(),
            "symptoms": ["chest pain", "shortness of breath", "sweating"],
            "patient_age": 58,
            "patient_gender": "male"
        })
    }

    pub fn mild_headache() -> serde_json::Value {
        json!({
            "patient_id": Uuid::new_v4().to_string(),
            "symptoms": ["mild headache"]
        })
    }

    pub fn respiratory(age: i64) -> serde_json::Value {
        json!({
            "patient_id": Uuid::new_v4().to_string(),
            "symptoms": ["fever", "cough"],
            "patient_age": age
        })
    }

    pub fn empty_symptoms() -> serde_json::Value {
        json!({
            "symptoms": []
        })
    }
}

/// Polls `check` until it returns true or the timeout elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
