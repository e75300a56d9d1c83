use tracing::debug;

use crate::models::{ConditionMatch, Gender};
use crate::services::knowledge::KnowledgeBase;

#[derive(Debug, Clone, Default)]
pub struct ConditionScan {
    /// Ranked, deduplicated, truncated candidates.
    pub conditions: Vec<ConditionMatch>,
    /// Urgency weights of every knowledge-base entry that matched at least once.
    pub matched_weights: Vec<u8>,
}

pub fn match_conditions(
    symptoms: &[String],
    age: Option<i64>,
    gender: Option<Gender>,
    kb: &KnowledgeBase,
) -> ConditionScan {
    let mut candidates = Vec::new();
    let mut entry_hit = vec![false; kb.conditions.len()];

    for symptom in symptoms {
        for (index, entry) in kb.conditions.iter().enumerate() {
            if !entry.matches(symptom) {
                continue;
            }
            entry_hit[index] = true;

            for candidate in &entry.conditions {
                let probability = adjust_for_demographics(
                    candidate.probability,
                    &candidate.name,
                    age,
                    gender,
                    kb,
                );

                candidates.push(ConditionMatch {
                    name: candidate.name.clone(),
                    probability,
                    severity: candidate.severity,
                    description: format!("Condition matching symptoms: {}", symptom),
                    icd_code: kb.icd_code(&candidate.name).map(str::to_string),
                    matched_symptoms: vec![symptom.clone()],
                });
            }
        }
    }

    debug!("Matched {} raw condition candidates", candidates.len());

    let matched_weights = kb
        .conditions
        .iter()
        .zip(entry_hit)
        .filter(|(_, hit)| *hit)
        .map(|(entry, _)| entry.urgency)
        .collect();

    ConditionScan {
        conditions: rank_conditions(candidates, kb.policy.max_conditions),
        matched_weights,
    }
}

/// Applies the age-bracket then the gender multiplier, clamping to 1.0 after each.
pub fn adjust_for_demographics(
    base_probability: f64,
    condition_name: &str,
    age: Option<i64>,
    gender: Option<Gender>,
    kb: &KnowledgeBase,
) -> f64 {
    let mut probability = base_probability.clamp(0.0, 1.0);

    if let Some(age) = age {
        let bracket = kb.policy.age_bracket(age);
        probability = (probability * kb.age_multiplier(condition_name, bracket)).min(1.0);
    }

    if let Some(gender) = gender {
        probability = (probability * kb.gender_multiplier(condition_name, gender)).min(1.0);
    }

    probability
}

/// Keeps one match per name (highest probability wins, first position is kept),
/// then sorts descending with a stable sort so ties stay in encounter order.
pub fn rank_conditions(candidates: Vec<ConditionMatch>, limit: usize) -> Vec<ConditionMatch> {
    let mut unique: Vec<ConditionMatch> = Vec::new();

    for candidate in candidates {
        match unique.iter_mut().find(|existing| existing.name == candidate.name) {
            Some(existing) => {
                let mut evidence = existing.matched_symptoms.clone();
                for symptom in &candidate.matched_symptoms {
                    if !evidence.contains(symptom) {
                        evidence.push(symptom.clone());
                    }
                }

                if candidate.probability > existing.probability {
                    *existing = candidate;
                }
                existing.matched_symptoms = evidence;
            }
            None => unique.push(candidate),
        }
    }

    unique.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    unique.truncate(limit);
    unique
}
