// =====================================================================================
// TRIAGE ENGINE
// =====================================================================================
//
// Single-pass rule cascade: normalise -> emergency screen -> condition matching
// -> demographic adjustment -> rank -> confidence -> actions -> specialties and
// follow-up questions. Pure function of the report and the knowledge base.
//
// =====================================================================================

use std::sync::Arc;

use tracing::{debug, error};

use crate::models::{
    SymptomReport, TriageError, TriageResult, DISCLAIMER, MAX_PATIENT_AGE, MIN_PATIENT_AGE,
};
use crate::services::conditions::match_conditions;
use crate::services::emergency::{assess_emergency, recommended_timeframe, urgency_score};
use crate::services::knowledge::{KnowledgeBase, PreparedKnowledgeBase};
use crate::services::normalizer::{infer_duration, infer_severity, normalize_symptoms};
use crate::services::recommendations::{
    calculate_confidence, follow_up_questions, generate_actions, recommend_specialties,
};

#[derive(Debug, Clone)]
pub struct TriageEngine {
    knowledge_base: Arc<PreparedKnowledgeBase>,
}

impl TriageEngine {
    /// Raw tables must go through [`KnowledgeBase::prepare`] first.
    pub fn new(knowledge_base: Arc<PreparedKnowledgeBase>) -> Self {
        Self { knowledge_base }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn analyze_symptoms(&self, report: &SymptomReport) -> Result<TriageResult, TriageError> {
        validate_report(report)?;

        let kb: &KnowledgeBase = &self.knowledge_base;

        let symptoms = normalize_symptoms(&report.symptoms, &kb.synonyms);
        if symptoms.is_empty() {
            return Err(TriageError::InvalidInput(
                "symptoms must contain at least one non-blank entry".to_string(),
            ));
        }
        debug!(?symptoms, "Normalised symptoms");

        let emergency = assess_emergency(&symptoms, kb);

        let scan = match_conditions(&symptoms, report.patient_age, report.patient_gender, kb);
        let conditions = scan.conditions;

        let confidence = calculate_confidence(symptoms.len(), &conditions, &report.medical_history, &kb.policy);

        let severity = report
            .severity
            .or_else(|| infer_severity(&symptoms, &kb.severity_indicators));
        let duration = report
            .duration
            .or_else(|| infer_duration(&symptoms, &kb.duration_indicators));
        let score = urgency_score(&scan.matched_weights, severity, duration, emergency.level, &kb.policy);

        let recommended_actions = generate_actions(emergency.level, &conditions);
        let recommended_specialties = recommend_specialties(&emergency.pattern_specialties, &conditions, kb);
        let follow_up_questions = follow_up_questions(&symptoms, &conditions, kb);

        let result = TriageResult {
            symptoms: report.symptoms.clone(),
            normalized_symptoms: symptoms,
            primary_conditions: conditions,
            confidence,
            emergency_level: emergency.level,
            emergency_score: emergency.score,
            matched_emergency_patterns: emergency.matched_patterns,
            urgency_score: score,
            recommended_timeframe: recommended_timeframe(score, &kb.policy).to_string(),
            recommended_actions,
            recommended_specialties,
            follow_up_questions,
            disclaimer: DISCLAIMER.to_string(),
        };

        check_invariants(&result, kb)?;
        Ok(result)
    }
}

fn validate_report(report: &SymptomReport) -> Result<(), TriageError> {
    if report.symptoms.is_empty() {
        return Err(TriageError::InvalidInput("symptoms must not be empty".to_string()));
    }

    if let Some(age) = report.patient_age {
        if !(MIN_PATIENT_AGE..=MAX_PATIENT_AGE).contains(&age) {
            return Err(TriageError::InvalidInput(format!(
                "patient_age must be between {} and {}, got {}",
                MIN_PATIENT_AGE, MAX_PATIENT_AGE, age
            )));
        }
    }

    Ok(())
}

fn check_invariants(result: &TriageResult, kb: &KnowledgeBase) -> Result<(), TriageError> {
    let fault = if !result.confidence.is_finite()
        || result.confidence < 0.0
        || result.confidence > kb.policy.confidence_ceiling
    {
        Some(format!("confidence {} outside [0, {}]", result.confidence, kb.policy.confidence_ceiling))
    } else if let Some(bad) = result
        .primary_conditions
        .iter()
        .find(|c| !c.probability.is_finite() || !(0.0..=1.0).contains(&c.probability))
    {
        Some(format!("probability {} for '{}' outside [0, 1]", bad.probability, bad.name))
    } else if !(1..=10).contains(&result.urgency_score) {
        Some(format!("urgency score {} outside 1-10", result.urgency_score))
    } else {
        None
    };

    match fault {
        Some(message) => {
            error!("Triage invariant violated: {}", message);
            Err(TriageError::InternalFault(message))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UrgencyLevel;
    use crate::services::knowledge::{BuiltinKnowledgeBase, KnowledgeBaseLoader};

    fn engine() -> TriageEngine {
        TriageEngine::new(Arc::new(BuiltinKnowledgeBase.load().unwrap()))
    }

    #[test]
    fn test_blank_symptoms_are_invalid() {
        let result = engine().analyze_symptoms(&SymptomReport::new(["   ", "\t"]));
        assert!(matches!(result, Err(TriageError::InvalidInput(_))));
    }

    #[test]
    fn test_unrecognised_symptoms_are_echoed() {
        let result = engine()
            .analyze_symptoms(&SymptomReport::new(["Purple toenails"]))
            .unwrap();
        assert_eq!(result.symptoms, vec!["Purple toenails".to_string()]);
        assert_eq!(result.normalized_symptoms, vec!["purple toenails".to_string()]);
        assert!(result.primary_conditions.is_empty());
        assert_eq!(result.emergency_level, UrgencyLevel::Low);
        assert_eq!(result.recommended_specialties, vec!["General Medicine".to_string()]);
        assert_eq!(result.urgency_score, 5);
    }

    #[test]
    fn test_invariant_check_flags_corrupt_probability() {
        let kb = BuiltinKnowledgeBase.load().unwrap();
        let mut result = engine().analyze_symptoms(&SymptomReport::new(["cough"])).unwrap();
        result.primary_conditions[0].probability = f64::NAN;
        assert!(matches!(check_invariants(&result, &kb), Err(TriageError::InternalFault(_))));
    }

    #[test]
    fn test_engine_runs_on_canonical_pattern_phrases() {
        let prepared = KnowledgeBase::builtin().prepare().unwrap();
        let engine = TriageEngine::new(Arc::new(prepared));
        let result = engine
            .analyze_symptoms(&SymptomReport::new(["shortness of breath", "nausea"]))
            .unwrap();
        assert_eq!(result.emergency_level, UrgencyLevel::High);
        assert_eq!(result.matched_emergency_patterns, vec!["cardiac".to_string()]);
        assert_eq!(result.recommended_timeframe, "Immediately");
    }

    #[test]
    fn test_patient_age_beyond_i32_is_invalid_input() {
        let report = SymptomReport::new(["fever"]).with_age(5_000_000_000);
        let result = engine().analyze_symptoms(&report);
        assert!(matches!(result, Err(TriageError::InvalidInput(message)) if message.contains("patient_age")));
    }
}
