use tracing::debug;

use crate::models::{DurationTag, SeverityTag, UrgencyLevel};
use crate::services::knowledge::{KnowledgeBase, ScoringPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyAssessment {
    pub score: u32,
    pub level: UrgencyLevel,
    pub matched_patterns: Vec<String>,
    pub pattern_specialties: Vec<String>,
}

pub fn assess_emergency(symptoms: &[String], kb: &KnowledgeBase) -> EmergencyAssessment {
    let policy = &kb.policy;
    let mut score = 0u32;

    for symptom in symptoms {
        for keyword in &kb.emergency_keywords {
            if symptom.contains(keyword.as_str()) {
                score += policy.keyword_increment;
            }
        }
    }

    let mut matched_patterns = Vec::new();
    let mut pattern_specialties = Vec::new();
    for pattern in &kb.emergency_patterns {
        let present = pattern
            .phrases
            .iter()
            .filter(|phrase| symptoms.iter().any(|s| s.contains(phrase.as_str())))
            .count();

        if present >= policy.pattern_min_matches {
            score += policy.pattern_increment;
            matched_patterns.push(pattern.name.clone());
            pattern_specialties.push(pattern.specialty.clone());
        }
    }

    let level = urgency_level(score, policy);
    debug!(score, ?level, patterns = ?matched_patterns, "Emergency screen complete");

    EmergencyAssessment {
        score,
        level,
        matched_patterns,
        pattern_specialties,
    }
}

pub fn urgency_level(score: u32, policy: &ScoringPolicy) -> UrgencyLevel {
    if score >= policy.high_threshold {
        UrgencyLevel::High
    } else if score >= policy.medium_threshold {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

/// Numeric 1-10 urgency: mean entry weight plus severity and onset adjustments,
/// never below the floor implied by the emergency level.
pub fn urgency_score(
    matched_weights: &[u8],
    severity: Option<SeverityTag>,
    duration: Option<DurationTag>,
    level: UrgencyLevel,
    policy: &ScoringPolicy,
) -> u8 {
    let mut score = if matched_weights.is_empty() {
        policy.default_urgency
    } else {
        matched_weights.iter().map(|w| f64::from(*w)).sum::<f64>() / matched_weights.len() as f64
    };

    score += match severity {
        Some(SeverityTag::Severe) => policy.severe_severity_adjustment,
        Some(SeverityTag::Moderate) => policy.moderate_severity_adjustment,
        Some(SeverityTag::Mild) | None => 0.0,
    };

    score += match duration {
        Some(DurationTag::Today) => policy.recent_onset_adjustment,
        Some(DurationTag::Months) => policy.long_standing_adjustment,
        Some(DurationTag::Days) | Some(DurationTag::Weeks) | None => 0.0,
    };

    let clamped = score.round().clamp(1.0, 10.0) as u8;

    match level {
        UrgencyLevel::High => clamped.max(policy.high_urgency_floor),
        UrgencyLevel::Medium => clamped.max(policy.medium_urgency_floor),
        UrgencyLevel::Low => clamped,
    }
}

/// The two urgent bands start at the policy's level floors so a High result
/// always reads "Immediately" and a Medium one at least "Within 24 hours".
pub fn recommended_timeframe(score: u8, policy: &ScoringPolicy) -> &'static str {
    if score >= policy.high_urgency_floor {
        "Immediately"
    } else if score >= policy.medium_urgency_floor {
        "Within 24 hours"
    } else if score >= 5 {
        "Within 3 days"
    } else if score >= 3 {
        "Within a week"
    } else {
        "At your convenience"
    }
}
