// =====================================================================================
// URGENT TRIAGE ALERTS
// =====================================================================================

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{error, warn, instrument};

use crate::models::{UrgencyLevel, UrgentTriageAlert};

/// Hand-off point for urgent results. Delivery channels live behind this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, alert: UrgentTriageAlert) -> Result<()>;
}

pub const DEFAULT_MAX_ACTIVE_ALERTS: usize = 1000;

/// Keeps unacknowledged alerts in memory and logs them by level. Once the
/// registry is full the oldest alert by timestamp is dropped.
pub struct AlertLogDispatcher {
    active_alerts: Arc<RwLock<HashMap<String, UrgentTriageAlert>>>,
    max_active_alerts: usize,
}

impl Default for AlertLogDispatcher {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ACTIVE_ALERTS)
    }
}

impl AlertLogDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_active_alerts: usize) -> Self {
        Self {
            active_alerts: Arc::new(RwLock::new(HashMap::new())),
            max_active_alerts: max_active_alerts.max(1),
        }
    }

    pub async fn get_active_alerts(&self) -> Vec<UrgentTriageAlert> {
        let alerts = self.active_alerts.read().await;
        let mut active: Vec<UrgentTriageAlert> = alerts.values().cloned().collect();
        active.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        active
    }

    pub async fn acknowledge_alert(&self, alert_id: &str) -> bool {
        let mut alerts = self.active_alerts.write().await;
        alerts.remove(alert_id).is_some()
    }

    pub async fn active_count(&self) -> usize {
        self.active_alerts.read().await.len()
    }
}

#[async_trait]
impl NotificationDispatcher for AlertLogDispatcher {
    #[instrument(skip(self, alert), fields(alert_id = %alert.alert_id))]
    async fn dispatch(&self, alert: UrgentTriageAlert) -> Result<()> {
        match alert.emergency_level {
            UrgencyLevel::High => {
                error!(
                    analysis_id = %alert.analysis_id,
                    patient_id = ?alert.patient_id,
                    urgency_score = alert.urgency_score,
                    patterns = ?alert.matched_emergency_patterns,
                    "URGENT TRIAGE ALERT: {}",
                    alert.primary_action.as_deref().unwrap_or("review immediately")
                );
            }
            UrgencyLevel::Medium | UrgencyLevel::Low => {
                warn!(
                    analysis_id = %alert.analysis_id,
                    urgency_score = alert.urgency_score,
                    "Triage alert: {}",
                    alert.primary_action.as_deref().unwrap_or("review soon")
                );
            }
        }

        let mut alerts = self.active_alerts.write().await;
        alerts.insert(alert.alert_id.clone(), alert);

        while alerts.len() > self.max_active_alerts {
            let oldest = alerts
                .values()
                .min_by_key(|a| a.timestamp)
                .map(|a| a.alert_id.clone());
            let Some(oldest) = oldest else { break };
            alerts.remove(&oldest);
            warn!(
                alert_id = %oldest,
                max_active_alerts = self.max_active_alerts,
                "Alert registry full, evicted oldest unacknowledged alert"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn alert(level: UrgencyLevel) -> UrgentTriageAlert {
        UrgentTriageAlert {
            alert_id: Uuid::new_v4().to_string(),
            analysis_id: Uuid::new_v4(),
            patient_id: Some("patient-1".to_string()),
            emergency_level: level,
            urgency_score: 9,
            matched_emergency_patterns: vec!["cardiac".to_string()],
            top_condition: Some("Heart Attack".to_string()),
            primary_action: Some("Seek immediate emergency care".to_string()),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_and_acknowledge() {
        let dispatcher = AlertLogDispatcher::new();
        let urgent = alert(UrgencyLevel::High);
        let alert_id = urgent.alert_id.clone();

        dispatcher.dispatch(urgent).await.unwrap();
        dispatcher.dispatch(alert(UrgencyLevel::Medium)).await.unwrap();
        assert_eq!(dispatcher.active_count().await, 2);

        assert!(dispatcher.acknowledge_alert(&alert_id).await);
        assert!(!dispatcher.acknowledge_alert(&alert_id).await);
        assert_eq!(dispatcher.get_active_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_registry_evicts_oldest_when_full() {
        let dispatcher = AlertLogDispatcher::with_capacity(3);
        let start = Utc::now();
        let mut ids = Vec::new();

        for offset in 0..10 {
            let mut next = alert(UrgencyLevel::High);
            next.timestamp = start + Duration::seconds(offset);
            ids.push(next.alert_id.clone());
            dispatcher.dispatch(next).await.unwrap();
        }

        assert_eq!(dispatcher.active_count().await, 3);
        let kept: Vec<String> = dispatcher
            .get_active_alerts()
            .await
            .into_iter()
            .map(|a| a.alert_id)
            .collect();
        assert_eq!(kept, ids[7..].to_vec());
        assert!(!dispatcher.acknowledge_alert(&ids[0]).await);
    }
}
