use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use shared_config::AppConfig;
use triage_cell::{create_triage_router, TriageHandlers};

pub fn create_router(config: Arc<AppConfig>) -> anyhow::Result<Router> {
    let triage_handlers = Arc::new(TriageHandlers::new(config)?);

    Ok(Router::new()
        .route("/", get(|| async { "Triage Clinic API is running!" }))
        .nest("/triage", create_triage_router(triage_handlers)))
}
