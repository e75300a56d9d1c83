use crate::models::{ActionPriority, ConditionMatch, ConditionSeverity, RecommendedAction, UrgencyLevel};
use crate::services::knowledge::{KnowledgeBase, ScoringPolicy};

pub fn calculate_confidence(
    symptom_count: usize,
    conditions: &[ConditionMatch],
    medical_history: &[String],
    policy: &ScoringPolicy,
) -> f64 {
    let mut confidence = policy.base_confidence;

    if symptom_count >= policy.many_symptoms_threshold {
        confidence += policy.many_symptoms_bonus;
    }

    if let Some(top) = conditions.first() {
        if top.probability > policy.top_probability_threshold {
            confidence += policy.top_probability_bonus;
        }
    }

    if history_overlaps(conditions, medical_history) {
        confidence += policy.history_overlap_bonus;
    }

    confidence.clamp(0.0, policy.confidence_ceiling)
}

fn history_overlaps(conditions: &[ConditionMatch], medical_history: &[String]) -> bool {
    let history: Vec<String> = medical_history
        .iter()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect();

    conditions.iter().any(|condition| {
        let name = condition.name.to_lowercase();
        history
            .iter()
            .any(|h| name.contains(h.as_str()) || h.contains(name.as_str()))
    })
}

pub fn generate_actions(level: UrgencyLevel, conditions: &[ConditionMatch]) -> Vec<RecommendedAction> {
    let mut actions = vec![match level {
        UrgencyLevel::High => RecommendedAction {
            action: "Seek immediate emergency care".to_string(),
            priority: ActionPriority::Urgent,
            description: "Your symptoms may indicate a serious condition requiring immediate medical attention.".to_string(),
            estimated_time: "Immediately".to_string(),
            specialist_required: false,
            follow_up_required: true,
        },
        UrgencyLevel::Medium => RecommendedAction {
            action: "Consult a doctor within 24 hours".to_string(),
            priority: ActionPriority::High,
            description: "Your symptoms should be evaluated by a healthcare professional soon.".to_string(),
            estimated_time: "Within 24 hours".to_string(),
            specialist_required: false,
            follow_up_required: true,
        },
        UrgencyLevel::Low => RecommendedAction {
            action: "Schedule an appointment with your doctor".to_string(),
            priority: ActionPriority::Medium,
            description: "Consider scheduling a routine appointment to discuss your symptoms.".to_string(),
            estimated_time: "Within 1-3 days".to_string(),
            specialist_required: false,
            follow_up_required: false,
        },
    }];

    let secondary = conditions.first().and_then(|primary| match primary.severity {
        ConditionSeverity::Mild => Some(RecommendedAction {
            action: "Monitor symptoms and rest".to_string(),
            priority: ActionPriority::Low,
            description: "Get adequate rest and monitor your symptoms for any changes.".to_string(),
            estimated_time: "Ongoing".to_string(),
            specialist_required: false,
            follow_up_required: false,
        }),
        ConditionSeverity::Severe | ConditionSeverity::Critical => Some(RecommendedAction {
            action: "Seek specialist consultation".to_string(),
            priority: ActionPriority::High,
            description: format!("Consider consulting a specialist for {}.", primary.name),
            estimated_time: "Within 48 hours".to_string(),
            specialist_required: true,
            follow_up_required: true,
        }),
        ConditionSeverity::Moderate => None,
    });

    if let Some(action) = secondary {
        if !actions.iter().any(|a| a.action == action.action) {
            actions.push(action);
        }
    }

    actions
}

/// Pattern specialties come first, then one specialty per ranked condition.
pub fn recommend_specialties(
    pattern_specialties: &[String],
    conditions: &[ConditionMatch],
    kb: &KnowledgeBase,
) -> Vec<String> {
    let mut specialties: Vec<String> = Vec::new();
    let mut push = |specialty: &str| {
        if !specialties.iter().any(|s| s == specialty) {
            specialties.push(specialty.to_string());
        }
    };

    for specialty in pattern_specialties {
        push(specialty);
    }

    for condition in conditions {
        let name = condition.name.to_lowercase();
        let specialty = kb
            .specialty_rules
            .iter()
            .find(|rule| name.contains(rule.keyword.as_str()))
            .map(|rule| rule.specialty.as_str())
            .unwrap_or(kb.policy.default_specialty.as_str());
        push(specialty);
    }

    if specialties.is_empty() {
        specialties.push(kb.policy.default_specialty.clone());
    }

    specialties
}

/// Category questions in bank order. A slot is reserved for the
/// condition-specific question so it survives the cap.
pub fn follow_up_questions(
    symptoms: &[String],
    conditions: &[ConditionMatch],
    kb: &KnowledgeBase,
) -> Vec<String> {
    let limit = kb.policy.max_follow_up_questions;

    let specific = conditions.first().and_then(|top| {
        let name = top.name.to_lowercase();
        kb.condition_questions
            .iter()
            .find(|q| name.contains(q.keyword.as_str()))
            .map(|q| q.question.clone())
    });

    let category_limit = if specific.is_some() { limit.saturating_sub(1) } else { limit };

    let mut questions: Vec<String> = kb
        .follow_up_categories
        .iter()
        .filter(|category| symptoms.iter().any(|s| s.contains(category.keyword.as_str())))
        .flat_map(|category| category.questions.iter().cloned())
        .take(category_limit)
        .collect();

    if let Some(question) = specific {
        if !questions.contains(&question) {
            questions.push(question);
        }
    }

    questions
}
