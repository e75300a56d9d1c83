use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DurationTag, SeverityTag};
use crate::services::knowledge::{DurationIndicator, SeverityIndicator, Synonym};

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}'\-\s]+").expect("punctuation pattern is valid")
});

/// Lower-cases, strips punctuation, collapses whitespace and rewrites synonym
/// phrases on word boundaries. Each position is rewritten at most once.
pub fn normalize_phrase(raw: &str, synonyms: &[Synonym]) -> String {
    let lowered = raw.to_lowercase();
    let cleaned = PUNCTUATION.replace_all(&lowered, " ");
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    let mut output: Vec<&str> = Vec::with_capacity(words.len());
    let mut i = 0;
    'outer: while i < words.len() {
        for synonym in synonyms {
            let phrase: Vec<&str> = synonym.phrase.split_whitespace().collect();
            if phrase.is_empty() || i + phrase.len() > words.len() {
                continue;
            }
            if words[i..i + phrase.len()] == phrase[..] {
                output.extend(synonym.canonical.split_whitespace());
                i += phrase.len();
                continue 'outer;
            }
        }
        output.push(words[i]);
        i += 1;
    }

    output.join(" ")
}

/// Normalises every symptom, dropping blanks and later duplicates.
pub fn normalize_symptoms(symptoms: &[String], synonyms: &[Synonym]) -> Vec<String> {
    let mut seen = HashSet::new();
    symptoms
        .iter()
        .map(|s| normalize_phrase(s, synonyms))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// First indicator group (in table order) with a phrase present in any symptom.
pub fn infer_severity(symptoms: &[String], indicators: &[SeverityIndicator]) -> Option<SeverityTag> {
    indicators
        .iter()
        .find(|indicator| any_phrase_present(symptoms, &indicator.phrases))
        .map(|indicator| indicator.severity)
}

pub fn infer_duration(symptoms: &[String], indicators: &[DurationIndicator]) -> Option<DurationTag> {
    indicators
        .iter()
        .find(|indicator| any_phrase_present(symptoms, &indicator.phrases))
        .map(|indicator| indicator.duration)
}

fn any_phrase_present(symptoms: &[String], phrases: &[String]) -> bool {
    phrases
        .iter()
        .any(|phrase| symptoms.iter().any(|s| s.contains(phrase.as_str())))
}
