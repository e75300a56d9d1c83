pub mod alerts;
pub mod analysis;
pub mod conditions;
pub mod emergency;
pub mod engine;
pub mod knowledge;
pub mod normalizer;
pub mod recommendations;
pub mod store;

pub use alerts::{AlertLogDispatcher, NotificationDispatcher};
pub use analysis::TriageService;
pub use engine::TriageEngine;
pub use knowledge::{
    loader_from_config, BuiltinKnowledgeBase, JsonFileKnowledgeBase, KnowledgeBase, KnowledgeBaseLoader,
    PreparedKnowledgeBase, ScoringPolicy,
};
pub use store::{AnalysisStore, SupabaseAnalysisStore};
