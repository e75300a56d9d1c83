use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::AnalysisRecord;

pub const ANALYSES_TABLE: &str = "symptom_analyses";

/// Destination for completed analyses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save_analysis(&self, record: &AnalysisRecord) -> Result<()>;
}

pub struct SupabaseAnalysisStore {
    supabase: SupabaseClient,
}

impl SupabaseAnalysisStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl AnalysisStore for SupabaseAnalysisStore {
    async fn save_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        debug!("Persisting analysis {} to {}", record.analysis_id, ANALYSES_TABLE);
        let row = serde_json::to_value(record)?;
        self.supabase.insert(ANALYSES_TABLE, row, None).await
    }
}
