// =====================================================================================
// TRIAGE KNOWLEDGE BASE
// =====================================================================================
//
// Static tables consumed by the engine: synonyms, emergency keywords and
// patterns, condition entries, demographic multipliers, specialty rules and the
// follow-up question bank. Built once at startup, shared read-only.
//
// =====================================================================================

use std::collections::BTreeMap;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{ConditionSeverity, DurationTag, Gender, SeverityTag};
use crate::services::normalizer::normalize_phrase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBracket {
    Pediatric,
    Adult,
    Elderly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synonym {
    pub phrase: String,
    pub canonical: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyPattern {
    pub name: String,
    pub phrases: Vec<String>,
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCondition {
    pub name: String,
    pub probability: f64,
    pub severity: ConditionSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub key: String,
    pub related_symptoms: Vec<String>,
    pub conditions: Vec<CandidateCondition>,
    /// Weight on the 1-10 urgency scale.
    pub urgency: u8,
}

impl ConditionEntry {
    pub fn matches(&self, symptom: &str) -> bool {
        symptom.contains(self.key.as_str())
            || self.related_symptoms.iter().any(|related| symptom.contains(related.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeMultiplier {
    pub condition: String,
    pub bracket: AgeBracket,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderMultiplier {
    pub condition: String,
    pub gender: Gender,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyRule {
    pub keyword: String,
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpCategory {
    pub keyword: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionQuestion {
    pub keyword: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityIndicator {
    pub severity: SeverityTag,
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationIndicator {
    pub duration: DurationTag,
    pub phrases: Vec<String>,
}

/// Every numeric threshold and increment the engine uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub keyword_increment: u32,
    pub pattern_increment: u32,
    pub pattern_min_matches: usize,
    pub medium_threshold: u32,
    pub high_threshold: u32,

    pub max_conditions: usize,
    pub pediatric_max_age: i32,
    pub elderly_min_age: i32,

    pub base_confidence: f64,
    pub many_symptoms_threshold: usize,
    pub many_symptoms_bonus: f64,
    pub top_probability_threshold: f64,
    pub top_probability_bonus: f64,
    pub history_overlap_bonus: f64,
    pub confidence_ceiling: f64,

    pub default_urgency: f64,
    pub moderate_severity_adjustment: f64,
    pub severe_severity_adjustment: f64,
    pub recent_onset_adjustment: f64,
    pub long_standing_adjustment: f64,
    pub medium_urgency_floor: u8,
    pub high_urgency_floor: u8,

    pub max_follow_up_questions: usize,
    pub default_specialty: String,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            keyword_increment: 1,
            pattern_increment: 2,
            pattern_min_matches: 2,
            medium_threshold: 1,
            high_threshold: 3,

            max_conditions: 5,
            pediatric_max_age: 17,
            elderly_min_age: 66,

            base_confidence: 0.70,
            many_symptoms_threshold: 3,
            many_symptoms_bonus: 0.10,
            top_probability_threshold: 0.6,
            top_probability_bonus: 0.10,
            history_overlap_bonus: 0.05,
            confidence_ceiling: 0.95,

            default_urgency: 5.0,
            moderate_severity_adjustment: 1.5,
            severe_severity_adjustment: 3.0,
            recent_onset_adjustment: 1.0,
            long_standing_adjustment: -1.0,
            medium_urgency_floor: 7,
            high_urgency_floor: 9,

            max_follow_up_questions: 5,
            default_specialty: "General Medicine".to_string(),
        }
    }
}

impl ScoringPolicy {
    pub fn age_bracket(&self, age: i64) -> AgeBracket {
        if age <= i64::from(self.pediatric_max_age) {
            AgeBracket::Pediatric
        } else if age >= i64::from(self.elderly_min_age) {
            AgeBracket::Elderly
        } else {
            AgeBracket::Adult
        }
    }

    fn validate(&self) -> Result<()> {
        if self.medium_threshold == 0 {
            bail!("medium_threshold must be at least 1");
        }
        if self.high_threshold <= self.medium_threshold {
            bail!(
                "high_threshold ({}) must be greater than medium_threshold ({})",
                self.high_threshold, self.medium_threshold
            );
        }
        if self.pattern_min_matches == 0 {
            bail!("pattern_min_matches must be at least 1");
        }
        if self.max_conditions == 0 {
            bail!("max_conditions must be at least 1");
        }
        if self.pediatric_max_age >= self.elderly_min_age {
            bail!("pediatric and elderly age brackets overlap");
        }
        if !(0.0..1.0).contains(&self.confidence_ceiling) {
            bail!("confidence_ceiling must be in [0, 1), got {}", self.confidence_ceiling);
        }
        if !(0.0..=self.confidence_ceiling).contains(&self.base_confidence) {
            bail!("base_confidence must be in [0, confidence_ceiling]");
        }
        let bonuses = [
            self.many_symptoms_bonus,
            self.top_probability_bonus,
            self.history_overlap_bonus,
        ];
        if bonuses.iter().any(|b| !b.is_finite() || *b < 0.0) {
            bail!("confidence bonuses must be finite and non-negative");
        }
        let adjustments = [
            self.default_urgency,
            self.moderate_severity_adjustment,
            self.severe_severity_adjustment,
            self.recent_onset_adjustment,
            self.long_standing_adjustment,
        ];
        if adjustments.iter().any(|a| !a.is_finite()) {
            bail!("urgency adjustments must be finite");
        }
        if !(1..=10).contains(&self.medium_urgency_floor) || !(1..=10).contains(&self.high_urgency_floor) {
            bail!("urgency floors must be within 1-10");
        }
        if self.medium_urgency_floor > self.high_urgency_floor {
            bail!(
                "medium_urgency_floor ({}) must not exceed high_urgency_floor ({})",
                self.medium_urgency_floor, self.high_urgency_floor
            );
        }
        if self.max_follow_up_questions == 0 {
            bail!("max_follow_up_questions must be at least 1");
        }
        if self.default_specialty.trim().is_empty() {
            bail!("default_specialty must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
    pub emergency_keywords: Vec<String>,
    pub emergency_patterns: Vec<EmergencyPattern>,
    pub conditions: Vec<ConditionEntry>,
    #[serde(default)]
    pub age_multipliers: Vec<AgeMultiplier>,
    #[serde(default)]
    pub gender_multipliers: Vec<GenderMultiplier>,
    #[serde(default)]
    pub icd_codes: BTreeMap<String, String>,
    #[serde(default)]
    pub specialty_rules: Vec<SpecialtyRule>,
    #[serde(default)]
    pub follow_up_categories: Vec<FollowUpCategory>,
    #[serde(default)]
    pub condition_questions: Vec<ConditionQuestion>,
    #[serde(default)]
    pub severity_indicators: Vec<SeverityIndicator>,
    #[serde(default)]
    pub duration_indicators: Vec<DurationIndicator>,
    #[serde(default)]
    pub common_symptoms: Vec<String>,
    #[serde(default)]
    pub policy: ScoringPolicy,
}

/// Tables that went through [`KnowledgeBase::prepare`]. The engine only
/// accepts this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PreparedKnowledgeBase(KnowledgeBase);

impl PreparedKnowledgeBase {
    pub fn into_inner(self) -> KnowledgeBase {
        self.0
    }
}

impl Deref for PreparedKnowledgeBase {
    type Target = KnowledgeBase;

    fn deref(&self) -> &KnowledgeBase {
        &self.0
    }
}

impl KnowledgeBase {
    /// Canonicalises every phrase through the synonym map and validates the tables.
    pub fn prepare(mut self) -> Result<PreparedKnowledgeBase> {
        self.canonicalize();
        self.validate()?;
        Ok(PreparedKnowledgeBase(self))
    }

    pub fn icd_code(&self, condition_name: &str) -> Option<&str> {
        self.icd_codes.get(condition_name).map(String::as_str)
    }

    pub fn age_multiplier(&self, condition_name: &str, bracket: AgeBracket) -> f64 {
        self.age_multipliers
            .iter()
            .find(|m| m.bracket == bracket && m.condition == condition_name)
            .map(|m| m.multiplier)
            .unwrap_or(1.0)
    }

    pub fn gender_multiplier(&self, condition_name: &str, gender: Gender) -> f64 {
        self.gender_multipliers
            .iter()
            .find(|m| m.gender == gender && m.condition == condition_name)
            .map(|m| m.multiplier)
            .unwrap_or(1.0)
    }

    fn canonicalize(&mut self) {
        for synonym in &mut self.synonyms {
            synonym.phrase = normalize_phrase(&synonym.phrase, &[]);
            synonym.canonical = normalize_phrase(&synonym.canonical, &[]);
        }
        self.synonyms.retain(|s| !s.phrase.is_empty());

        let synonyms = self.synonyms.clone();
        let canon = |phrase: &mut String| *phrase = normalize_phrase(phrase, &synonyms);
        let canon_all = |phrases: &mut Vec<String>| {
            for phrase in phrases.iter_mut() {
                *phrase = normalize_phrase(phrase, &synonyms);
            }
            phrases.retain(|p| !p.is_empty());
        };

        canon_all(&mut self.emergency_keywords);
        for pattern in &mut self.emergency_patterns {
            canon_all(&mut pattern.phrases);
        }
        for entry in &mut self.conditions {
            canon(&mut entry.key);
            canon_all(&mut entry.related_symptoms);
        }
        for rule in &mut self.specialty_rules {
            rule.keyword = rule.keyword.trim().to_lowercase();
        }
        for category in &mut self.follow_up_categories {
            canon(&mut category.keyword);
        }
        for question in &mut self.condition_questions {
            question.keyword = question.keyword.trim().to_lowercase();
        }
        for indicator in &mut self.severity_indicators {
            canon_all(&mut indicator.phrases);
        }
        for indicator in &mut self.duration_indicators {
            canon_all(&mut indicator.phrases);
        }
    }

    fn validate(&self) -> Result<()> {
        self.policy.validate()?;

        if self.conditions.is_empty() {
            bail!("knowledge base has no condition entries");
        }
        for entry in &self.conditions {
            if entry.key.is_empty() {
                bail!("condition entry with empty key");
            }
            if !(1..=10).contains(&entry.urgency) {
                bail!("entry '{}' has urgency {} outside 1-10", entry.key, entry.urgency);
            }
            for candidate in &entry.conditions {
                if candidate.name.trim().is_empty() {
                    bail!("entry '{}' has a candidate without a name", entry.key);
                }
                if !candidate.probability.is_finite() || !(0.0..=1.0).contains(&candidate.probability) {
                    bail!(
                        "candidate '{}' has probability {} outside [0, 1]",
                        candidate.name, candidate.probability
                    );
                }
            }
        }
        for pattern in &self.emergency_patterns {
            if pattern.phrases.is_empty() {
                bail!("emergency pattern '{}' has no phrases", pattern.name);
            }
        }
        let multipliers = self.age_multipliers.iter().map(|m| (&m.condition, m.multiplier))
            .chain(self.gender_multipliers.iter().map(|m| (&m.condition, m.multiplier)));
        for (condition, multiplier) in multipliers {
            if !multiplier.is_finite() || multiplier < 0.0 {
                bail!("multiplier for '{}' must be finite and non-negative", condition);
            }
        }
        Ok(())
    }

    /// Tables shipped with the service.
    pub fn builtin() -> Self {
        Self {
            synonyms: vec![
                synonym("tummy ache", "stomach pain"),
                synonym("belly pain", "stomach pain"),
                synonym("belly ache", "stomach pain"),
                synonym("runny nose", "nasal congestion"),
                synonym("stuffy nose", "nasal congestion"),
                synonym("sore throat", "throat pain"),
                synonym("shortness of breath", "difficulty breathing"),
                synonym("short of breath", "difficulty breathing"),
                synonym("trouble breathing", "difficulty breathing"),
                synonym("high temperature", "fever"),
            ],
            emergency_keywords: strings(&[
                "chest pain", "difficulty breathing", "severe headache", "unconscious",
                "seizure", "severe bleeding", "poisoning", "severe burns", "paralysis",
                "severe abdominal pain", "high fever", "confusion", "severe allergic reaction",
            ]),
            emergency_patterns: vec![
                pattern("cardiac", &["chest pain", "shortness of breath", "sweating", "nausea"], "Cardiology"),
                pattern("neurological", &["severe headache", "confusion", "seizure", "paralysis"], "Neurology"),
                pattern("respiratory", &["difficulty breathing", "wheezing", "blue lips"], "Pulmonology"),
                pattern(
                    "gastrointestinal",
                    &["severe abdominal pain", "blood in vomit", "black stool"],
                    "Gastroenterology",
                ),
            ],
            conditions: vec![
                entry(
                    "fever",
                    &["chills", "body ache"],
                    vec![
                        candidate("Viral Fever", 0.6, ConditionSeverity::Mild),
                        candidate("Dengue Fever", 0.3, ConditionSeverity::Moderate),
                        candidate("Typhoid", 0.1, ConditionSeverity::Severe),
                    ],
                    6,
                ),
                entry(
                    "cough",
                    &["nasal congestion", "phlegm", "wheezing"],
                    vec![
                        candidate("Common Cold", 0.5, ConditionSeverity::Mild),
                        candidate("Bronchitis", 0.3, ConditionSeverity::Moderate),
                        candidate("Pneumonia", 0.2, ConditionSeverity::Severe),
                    ],
                    4,
                ),
                entry(
                    "stomach pain",
                    &["abdominal pain", "vomiting", "diarrhea", "loss of appetite"],
                    vec![
                        candidate("Gastritis", 0.4, ConditionSeverity::Mild),
                        candidate("Food Poisoning", 0.3, ConditionSeverity::Moderate),
                        candidate("Appendicitis", 0.1, ConditionSeverity::Severe),
                    ],
                    6,
                ),
                entry(
                    "headache",
                    &["sensitivity to light", "neck stiffness", "migraine"],
                    vec![
                        candidate("Tension Headache", 0.6, ConditionSeverity::Mild),
                        candidate("Migraine", 0.3, ConditionSeverity::Moderate),
                        candidate("Meningitis", 0.05, ConditionSeverity::Critical),
                    ],
                    5,
                ),
                entry(
                    "chest pain",
                    &["chest tightness", "palpitations"],
                    vec![
                        candidate("Muscle Strain", 0.4, ConditionSeverity::Mild),
                        candidate("Acid Reflux", 0.3, ConditionSeverity::Mild),
                        candidate("Heart Attack", 0.1, ConditionSeverity::Critical),
                    ],
                    9,
                ),
                entry(
                    "difficulty breathing",
                    &["blue lips"],
                    vec![
                        candidate("Asthma", 0.4, ConditionSeverity::Moderate),
                        candidate("COPD", 0.2, ConditionSeverity::Moderate),
                        candidate("Heart Failure", 0.1, ConditionSeverity::Severe),
                    ],
                    8,
                ),
                entry(
                    "nausea",
                    &["queasy"],
                    vec![
                        candidate("Gastroenteritis", 0.4, ConditionSeverity::Mild),
                        candidate("Food Poisoning", 0.3, ConditionSeverity::Moderate),
                    ],
                    5,
                ),
                entry(
                    "rash",
                    &["itching", "hives"],
                    vec![
                        candidate("Allergic Reaction", 0.4, ConditionSeverity::Mild),
                        candidate("Eczema", 0.3, ConditionSeverity::Mild),
                        candidate("Contact Dermatitis", 0.3, ConditionSeverity::Mild),
                    ],
                    4,
                ),
                entry(
                    "joint pain",
                    &["joint swelling", "stiff joints"],
                    vec![
                        candidate("Arthritis", 0.4, ConditionSeverity::Moderate),
                        candidate("Rheumatoid Arthritis", 0.2, ConditionSeverity::Moderate),
                        candidate("Gout", 0.2, ConditionSeverity::Moderate),
                    ],
                    5,
                ),
                entry(
                    "back pain",
                    &["lower back"],
                    vec![
                        candidate("Muscle Strain", 0.5, ConditionSeverity::Mild),
                        candidate("Herniated Disc", 0.2, ConditionSeverity::Moderate),
                        candidate("Sciatica", 0.2, ConditionSeverity::Moderate),
                    ],
                    5,
                ),
                entry(
                    "throat pain",
                    &["swollen tonsils"],
                    vec![
                        candidate("Pharyngitis", 0.5, ConditionSeverity::Mild),
                        candidate("Tonsillitis", 0.3, ConditionSeverity::Mild),
                        candidate("Strep Throat", 0.2, ConditionSeverity::Moderate),
                    ],
                    3,
                ),
                entry(
                    "ear pain",
                    &["earache"],
                    vec![
                        candidate("Otitis Media", 0.5, ConditionSeverity::Mild),
                        candidate("Otitis Externa", 0.3, ConditionSeverity::Mild),
                    ],
                    4,
                ),
                entry(
                    "dizziness",
                    &["vertigo", "lightheaded"],
                    vec![
                        candidate("Vertigo", 0.4, ConditionSeverity::Mild),
                        candidate("Labyrinthitis", 0.2, ConditionSeverity::Moderate),
                        candidate("Hypotension", 0.2, ConditionSeverity::Moderate),
                    ],
                    6,
                ),
            ],
            age_multipliers: vec![
                age_multiplier("Viral Fever", AgeBracket::Pediatric, 1.2),
                age_multiplier("Common Cold", AgeBracket::Pediatric, 1.2),
                age_multiplier("Otitis Media", AgeBracket::Pediatric, 1.3),
                age_multiplier("Pneumonia", AgeBracket::Elderly, 1.3),
                age_multiplier("Heart Attack", AgeBracket::Elderly, 1.3),
                age_multiplier("Heart Failure", AgeBracket::Elderly, 1.3),
            ],
            gender_multipliers: vec![
                gender_multiplier("Migraine", Gender::Female, 1.4),
                gender_multiplier("Heart Attack", Gender::Male, 1.2),
                gender_multiplier("Gout", Gender::Male, 1.3),
            ],
            icd_codes: [
                ("Viral Fever", "R50.9"),
                ("Dengue Fever", "A90"),
                ("Typhoid", "A01.0"),
                ("Common Cold", "J00"),
                ("Bronchitis", "J40"),
                ("Pneumonia", "J18.9"),
                ("Gastritis", "K29.7"),
                ("Food Poisoning", "A05.9"),
                ("Appendicitis", "K37"),
                ("Tension Headache", "G44.2"),
                ("Migraine", "G43.9"),
                ("Meningitis", "G03.9"),
                ("Acid Reflux", "K21.9"),
                ("Heart Attack", "I21.9"),
                ("Asthma", "J45.909"),
                ("COPD", "J44.9"),
                ("Heart Failure", "I50.9"),
                ("Gastroenteritis", "K52.9"),
                ("Pharyngitis", "J02.9"),
                ("Otitis Media", "H66.90"),
            ]
            .into_iter()
            .map(|(name, code)| (name.to_string(), code.to_string()))
            .collect(),
            specialty_rules: vec![
                rule("heart", "Cardiology"),
                rule("cardiac", "Cardiology"),
                rule("pneumonia", "Pulmonology"),
                rule("bronch", "Pulmonology"),
                rule("asthma", "Pulmonology"),
                rule("copd", "Pulmonology"),
                rule("lung", "Pulmonology"),
                rule("respiratory", "Pulmonology"),
                rule("stomach", "Gastroenterology"),
                rule("gastr", "Gastroenterology"),
                rule("reflux", "Gastroenterology"),
                rule("appendic", "General Surgery"),
                rule("headache", "Neurology"),
                rule("migraine", "Neurology"),
                rule("mening", "Neurology"),
                rule("neuro", "Neurology"),
                rule("vertigo", "Neurology"),
                rule("dermat", "Dermatology"),
                rule("eczema", "Dermatology"),
                rule("allerg", "Dermatology"),
                rule("arthritis", "Rheumatology"),
                rule("gout", "Rheumatology"),
                rule("disc", "Orthopedics"),
                rule("sciatica", "Orthopedics"),
                rule("otitis", "ENT"),
                rule("tonsil", "ENT"),
                rule("pharyng", "ENT"),
            ],
            follow_up_categories: vec![
                follow_up("pain", &[
                    "On a scale of 1-10, how would you rate your pain level?",
                    "Does the pain worsen with movement or remain constant?",
                ]),
                follow_up("fever", &[
                    "Have you measured your temperature? If so, what was it?",
                    "How long have you had the fever?",
                ]),
                follow_up("cough", &[
                    "Is your cough dry or do you produce phlegm?",
                    "Does the cough worsen at night?",
                ]),
                follow_up("breathing", &[
                    "Do you feel short of breath at rest or only during exertion?",
                ]),
                follow_up("rash", &[
                    "Has the rash spread or changed colour since it appeared?",
                ]),
            ],
            condition_questions: vec![
                condition_question("dengue", "Have you been in an area with mosquito activity recently?"),
                condition_question("heart", "Do you have a family history of heart disease?"),
                condition_question("migraine", "Do you notice visual disturbances before the headache starts?"),
                condition_question("pneumonia", "Have you had chills or a temperature above 38.5°C?"),
                condition_question(
                    "appendicitis",
                    "Did the pain start near your navel and move to the lower right abdomen?",
                ),
            ],
            severity_indicators: vec![
                severity_indicator(SeverityTag::Severe, &[
                    "severe", "intense", "extreme", "unbearable", "worst", "terrible", "sharp",
                ]),
                severity_indicator(SeverityTag::Moderate, &[
                    "moderate", "persistent", "frequent", "noticeable",
                ]),
                severity_indicator(SeverityTag::Mild, &[
                    "mild", "slight", "minor", "occasional", "barely",
                ]),
            ],
            duration_indicators: vec![
                duration_indicator(DurationTag::Today, &[
                    "today", "this morning", "sudden", "just started", "an hour ago",
                ]),
                duration_indicator(DurationTag::Days, &[
                    "yesterday", "few days", "couple of days", "since monday",
                ]),
                duration_indicator(DurationTag::Weeks, &["week", "fortnight"]),
                duration_indicator(DurationTag::Months, &[
                    "month", "chronic", "year", "long time",
                ]),
            ],
            common_symptoms: strings(&[
                "fever", "headache", "cough", "sore throat", "fatigue",
                "nausea", "vomiting", "diarrhea", "stomach pain", "chest pain",
                "shortness of breath", "dizziness", "muscle aches", "joint pain",
            ]),
            policy: ScoringPolicy::default(),
        }
    }
}

// ==============================================================================
// LOADERS
// ==============================================================================

pub trait KnowledgeBaseLoader: Send + Sync {
    fn load(&self) -> Result<PreparedKnowledgeBase>;
}

pub struct BuiltinKnowledgeBase;

impl KnowledgeBaseLoader for BuiltinKnowledgeBase {
    fn load(&self) -> Result<PreparedKnowledgeBase> {
        let kb = KnowledgeBase::builtin().prepare()?;
        debug!("Loaded builtin knowledge base with {} condition entries", kb.conditions.len());
        Ok(kb)
    }
}

/// Reads a JSON document with the same shape as [`KnowledgeBase`].
pub struct JsonFileKnowledgeBase {
    path: PathBuf,
}

impl JsonFileKnowledgeBase {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl KnowledgeBaseLoader for JsonFileKnowledgeBase {
    fn load(&self) -> Result<PreparedKnowledgeBase> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read knowledge base {}", self.path.display()))?;
        let kb: KnowledgeBase = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse knowledge base {}", self.path.display()))?;
        let kb = kb
            .prepare()
            .with_context(|| format!("invalid knowledge base {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            entries = kb.conditions.len(),
            "Loaded knowledge base from file"
        );
        Ok(kb)
    }
}

pub fn loader_from_config(config: &AppConfig) -> Box<dyn KnowledgeBaseLoader> {
    match &config.triage_knowledge_base_path {
        Some(path) => Box::new(JsonFileKnowledgeBase::new(path)),
        None => Box::new(BuiltinKnowledgeBase),
    }
}

// ==============================================================================
// TABLE BUILDERS
// ==============================================================================

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn synonym(phrase: &str, canonical: &str) -> Synonym {
    Synonym {
        phrase: phrase.to_string(),
        canonical: canonical.to_string(),
    }
}

fn pattern(name: &str, phrases: &[&str], specialty: &str) -> EmergencyPattern {
    EmergencyPattern {
        name: name.to_string(),
        phrases: strings(phrases),
        specialty: specialty.to_string(),
    }
}

fn candidate(name: &str, probability: f64, severity: ConditionSeverity) -> CandidateCondition {
    CandidateCondition {
        name: name.to_string(),
        probability,
        severity,
    }
}

fn entry(
    key: &str,
    related: &[&str],
    conditions: Vec<CandidateCondition>,
    urgency: u8,
) -> ConditionEntry {
    ConditionEntry {
        key: key.to_string(),
        related_symptoms: strings(related),
        conditions,
        urgency,
    }
}

fn age_multiplier(condition: &str, bracket: AgeBracket, multiplier: f64) -> AgeMultiplier {
    AgeMultiplier {
        condition: condition.to_string(),
        bracket,
        multiplier,
    }
}

fn gender_multiplier(condition: &str, gender: Gender, multiplier: f64) -> GenderMultiplier {
    GenderMultiplier {
        condition: condition.to_string(),
        gender,
        multiplier,
    }
}

fn rule(keyword: &str, specialty: &str) -> SpecialtyRule {
    SpecialtyRule {
        keyword: keyword.to_string(),
        specialty: specialty.to_string(),
    }
}

fn follow_up(keyword: &str, questions: &[&str]) -> FollowUpCategory {
    FollowUpCategory {
        keyword: keyword.to_string(),
        questions: strings(questions),
    }
}

fn condition_question(keyword: &str, question: &str) -> ConditionQuestion {
    ConditionQuestion {
        keyword: keyword.to_string(),
        question: question.to_string(),
    }
}

fn severity_indicator(severity: SeverityTag, phrases: &[&str]) -> SeverityIndicator {
    SeverityIndicator {
        severity,
        phrases: strings(phrases),
    }
}

fn duration_indicator(duration: DurationTag, phrases: &[&str]) -> DurationIndicator {
    DurationIndicator {
        duration,
        phrases: strings(phrases),
    }
}
