// =====================================================================================
// TRIAGE CELL - RULE-BASED SYMPTOM TRIAGE
// =====================================================================================
//
// Turns a patient's free-text symptom list into ranked candidate conditions,
// an emergency urgency level, recommended actions, specialties and follow-up
// questions. Results are persisted and urgent ones raise alerts.
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    ConditionMatch, Gender, RecommendedAction, SymptomAnalysis, SymptomAnalysisRequest,
    SymptomReport, TriageError, TriageResult, UrgencyLevel, UrgentTriageAlert,
};

pub use services::{
    AlertLogDispatcher, AnalysisStore, KnowledgeBase, KnowledgeBaseLoader, NotificationDispatcher,
    PreparedKnowledgeBase, TriageEngine, TriageService,
};

pub use handlers::TriageHandlers;
pub use router::create_triage_router;
