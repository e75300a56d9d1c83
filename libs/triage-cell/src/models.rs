// =====================================================================================
// TRIAGE CELL MODELS
// =====================================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

pub const MIN_PATIENT_AGE: i64 = 0;
pub const MAX_PATIENT_AGE: i64 = 120;

pub const DISCLAIMER: &str = "This analysis is for informational purposes only and should not replace professional medical advice.";

// ==============================================================================
// INPUT TYPES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    /// Lenient parse; anything unrecognised is treated as no information.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            "unknown" => Some(Gender::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTag {
    Mild,
    Moderate,
    Severe,
}

impl SeverityTag {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mild" => Some(SeverityTag::Mild),
            "moderate" => Some(SeverityTag::Moderate),
            "severe" => Some(SeverityTag::Severe),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationTag {
    Today,
    Days,
    Weeks,
    Months,
}

impl DurationTag {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "today" => Some(DurationTag::Today),
            "days" => Some(DurationTag::Days),
            "weeks" => Some(DurationTag::Weeks),
            "months" => Some(DurationTag::Months),
            _ => None,
        }
    }
}

/// What the patient reported for a single analysis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomReport {
    pub symptoms: Vec<String>,
    pub patient_age: Option<i64>,
    pub patient_gender: Option<Gender>,
    pub medical_history: Vec<String>,
    pub severity: Option<SeverityTag>,
    pub duration: Option<DurationTag>,
}

impl SymptomReport {
    pub fn new<I, S>(symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symptoms: symptoms.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.patient_age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.patient_gender = Some(gender);
        self
    }

    pub fn with_medical_history<I, S>(mut self, history: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.medical_history = history.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_severity(mut self, severity: SeverityTag) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_duration(mut self, duration: DurationTag) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Wire request for `POST /triage/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymptomAnalysisRequest {
    pub patient_id: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub patient_age: Option<i64>,
    pub patient_gender: Option<String>,
    pub medical_history: Option<Vec<String>>,
    #[serde(alias = "severity")]
    pub severity_level: Option<String>,
    pub duration: Option<String>,
}

impl SymptomAnalysisRequest {
    pub fn to_report(&self) -> SymptomReport {
        SymptomReport {
            symptoms: self.symptoms.clone(),
            patient_age: self.patient_age,
            patient_gender: self.patient_gender.as_deref().and_then(Gender::parse),
            medical_history: self.medical_history.clone().unwrap_or_default(),
            severity: self.severity_level.as_deref().and_then(SeverityTag::parse),
            duration: self.duration.as_deref().and_then(DurationTag::parse),
        }
    }
}

// ==============================================================================
// OUTPUT TYPES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
}

impl UrgencyLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(UrgencyLevel::Low),
            "medium" => Some(UrgencyLevel::Medium),
            "high" => Some(UrgencyLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyLevel::Low => write!(f, "low"),
            UrgencyLevel::Medium => write!(f, "medium"),
            UrgencyLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionSeverity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Urgent,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionMatch {
    pub name: String,
    pub probability: f64,
    pub severity: ConditionSeverity,
    pub description: String,
    pub icd_code: Option<String>,
    pub matched_symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub action: String,
    pub priority: ActionPriority,
    pub description: String,
    pub estimated_time: String,
    pub specialist_required: bool,
    pub follow_up_required: bool,
}

/// Decision values produced by the engine. Contains no identifiers or
/// timestamps, so equal inputs give equal results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub symptoms: Vec<String>,
    pub normalized_symptoms: Vec<String>,
    pub primary_conditions: Vec<ConditionMatch>,
    pub confidence: f64,
    pub emergency_level: UrgencyLevel,
    pub emergency_score: u32,
    pub matched_emergency_patterns: Vec<String>,
    pub urgency_score: u8,
    pub recommended_timeframe: String,
    pub recommended_actions: Vec<RecommendedAction>,
    pub recommended_specialties: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub disclaimer: String,
}

impl TriageResult {
    pub fn top_condition(&self) -> Option<&ConditionMatch> {
        self.primary_conditions.first()
    }

    pub fn primary_action(&self) -> Option<&RecommendedAction> {
        self.recommended_actions.first()
    }
}

/// Response envelope returned by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomAnalysis {
    pub analysis_id: Uuid,
    pub patient_id: Option<String>,
    pub analysis_timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub result: TriageResult,
}

/// Row written to the `symptom_analyses` table.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub analysis_id: Uuid,
    pub patient_id: Option<String>,
    pub symptoms: Vec<String>,
    pub emergency_level: UrgencyLevel,
    pub confidence: f64,
    pub analysis_result: TriageResult,
    pub analysis_type: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn from_analysis(analysis: &SymptomAnalysis) -> Self {
        Self {
            analysis_id: analysis.analysis_id,
            patient_id: analysis.patient_id.clone(),
            symptoms: analysis.result.symptoms.clone(),
            emergency_level: analysis.result.emergency_level,
            confidence: analysis.result.confidence,
            analysis_result: analysis.result.clone(),
            analysis_type: "symptom_analysis".to_string(),
            created_at: analysis.analysis_timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgentTriageAlert {
    pub alert_id: String,
    pub analysis_id: Uuid,
    pub patient_id: Option<String>,
    pub emergency_level: UrgencyLevel,
    pub urgency_score: u8,
    pub matched_emergency_patterns: Vec<String>,
    pub top_condition: Option<String>,
    pub primary_action: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl UrgentTriageAlert {
    pub fn from_analysis(analysis: &SymptomAnalysis) -> Self {
        Self {
            alert_id: Uuid::new_v4().to_string(),
            analysis_id: analysis.analysis_id,
            patient_id: analysis.patient_id.clone(),
            emergency_level: analysis.result.emergency_level,
            urgency_score: analysis.result.urgency_score,
            matched_emergency_patterns: analysis.result.matched_emergency_patterns.clone(),
            top_condition: analysis.result.top_condition().map(|c| c.name.clone()),
            primary_action: analysis.result.primary_action().map(|a| a.action.clone()),
            timestamp: analysis.analysis_timestamp,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum TriageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal fault: {0}")]
    InternalFault(String),
}

impl From<TriageError> for AppError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::InvalidInput(msg) => AppError::ValidationError(msg),
            TriageError::InternalFault(msg) => AppError::Internal(msg),
        }
    }
}
