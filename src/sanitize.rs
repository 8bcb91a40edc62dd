//! PII removal chokepoint, applied before anything leaves the trust
//! boundary.
//!
//! Three mechanisms:
//! - identity pseudonymization via a salted one-way hash,
//! - ordered pattern→placeholder substitution over free text,
//! - structured-field allowlisting for blood, gene, and vital data.
//!
//! Pure transformation — no network or storage access. The salt is
//! required; there is no unsalted fallback.

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::ChatError;
use crate::types::{
    ChatRequest, FitnessLevel, GeneCategory, GeneData, GeneMarker, LabItem, Message,
    RestingHrLevel, SanitizedCategory, SanitizedGeneData, SanitizedLabItem, SanitizedMarker,
    SanitizedRequest, SanitizedVitals, VitalSnapshot,
};

/// Reserved token for an empty identity. Never hashed.
pub const ANONYMOUS_TOKEN: &str = "anonymous";

/// Hex digits of the digest kept in the pseudonymous token.
const TOKEN_DIGEST_LEN: usize = 12;

/// Ordered pattern → placeholder substitutions. Order matters: phone and
/// long-id digit groups overlap, so each pattern runs against the result
/// of the previous one. All patterns are case-insensitive; phone and id
/// groups accept the full-width hyphen.
const PII_PATTERNS: [(&str, &str); 5] = [
    (
        r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        "[EMAIL]",
    ),
    (r"(?i)\b0\d{1,4}[-−]?\d{1,4}[-−]?\d{4}\b", "[PHONE]"),
    (r"(?i)\b\d{3}[-−]?\d{4}[-−]?\d{4}\b", "[ID]"),
    (r"(?i)\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b", "[DATE]"),
    (r"(?i)\brs\d+\b", "[SNP]"),
];

/// VO2max bucket thresholds (ml/kg/min).
const VO2MAX_MODERATE: f64 = 35.0;
const VO2MAX_HIGH: f64 = 45.0;

/// Resting heart rate bucket thresholds (bpm).
const RESTING_HR_ATHLETE: f64 = 55.0;
const RESTING_HR_GOOD: f64 = 70.0;

/// Redacts personal data from an inbound request.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    salt: String,
    patterns: Vec<(Regex, &'static str)>,
}

impl Sanitizer {
    /// Create a sanitizer with the given pseudonymization salt.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] when the salt is absent or
    /// empty — proceeding unsalted is forbidden.
    pub fn new(salt: Option<String>) -> Result<Self, ChatError> {
        let salt = salt.filter(|s| !s.is_empty()).ok_or_else(|| {
            ChatError::Configuration(
                "pseudonymization salt is not set (HEALTHCHAT_PII_SALT)".to_owned(),
            )
        })?;
        let mut patterns = Vec::with_capacity(PII_PATTERNS.len());
        for (pattern, placeholder) in PII_PATTERNS {
            let regex = Regex::new(pattern).map_err(|e| {
                ChatError::Internal(format!("invalid redaction pattern {pattern:?}: {e}"))
            })?;
            patterns.push((regex, placeholder));
        }
        Ok(Self { salt, patterns })
    }

    /// Derive the pseudonymous token for a user identity.
    ///
    /// Deterministic for a fixed salt, not invertible without it. An
    /// empty identity maps to the reserved [`ANONYMOUS_TOKEN`].
    pub fn pseudonymize(&self, user_identity: &str) -> String {
        if user_identity.is_empty() {
            return ANONYMOUS_TOKEN.to_owned();
        }
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(b":");
        hasher.update(user_identity.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("user_{}", &digest[..TOKEN_DIGEST_LEN])
    }

    /// Apply the ordered pattern substitutions to free text.
    pub fn redact_text(&self, text: &str) -> String {
        let mut result = text.to_owned();
        for (regex, placeholder) in &self.patterns {
            result = regex.replace_all(&result, *placeholder).into_owned();
        }
        result
    }

    /// Produce the redacted request handed to the context builder.
    pub fn sanitize(&self, request: &ChatRequest) -> SanitizedRequest {
        SanitizedRequest {
            user_token: self.pseudonymize(&request.user_identity),
            message: self.redact_text(&request.message),
            topic: request.topic.clone(),
            history: request
                .conversation_history
                .iter()
                .map(|msg| Message {
                    role: msg.role,
                    content: self.redact_text(&msg.content),
                })
                .collect(),
            blood_panel: request
                .blood_data
                .as_ref()
                .map(|items| items.iter().map(sanitize_lab_item).collect()),
            gene_data: request.gene_data.as_ref().map(sanitize_gene_data),
            vitals: request.vital_data.as_ref().map(sanitize_vitals),
        }
    }
}

/// Keep only the allowlisted lab fields; the internal key is dropped.
fn sanitize_lab_item(item: &LabItem) -> SanitizedLabItem {
    SanitizedLabItem {
        name: item.display_name.clone(),
        value: value_text(&item.value),
        unit: item.unit.clone(),
        reference_range: item.reference_range.clone(),
        status: item.status,
    }
}

/// Render a JSON value as plain text, without quoting strings.
fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Drop genotypes and SNP identifiers, keep title and coarse impact. The
/// reserved category-name list passes through unmodified.
fn sanitize_gene_data(data: &GeneData) -> SanitizedGeneData {
    SanitizedGeneData {
        available_categories: data.available_categories.clone(),
        categories: data
            .categories
            .iter()
            .map(|(name, category)| {
                let sanitized = match category {
                    GeneCategory::Single(marker) => {
                        SanitizedCategory::Single(sanitize_marker(marker))
                    }
                    GeneCategory::Many(markers) => {
                        SanitizedCategory::Many(markers.iter().map(sanitize_marker).collect())
                    }
                };
                (name.clone(), sanitized)
            })
            .collect(),
    }
}

fn sanitize_marker(marker: &GeneMarker) -> SanitizedMarker {
    SanitizedMarker {
        title: marker.title.clone(),
        impact_score: marker.impact.as_ref().map(|impact| impact.score),
        score_level: marker.score_level.clone(),
    }
}

/// Collapse absolute vitals into presence flags and coarse buckets.
fn sanitize_vitals(vitals: &VitalSnapshot) -> SanitizedVitals {
    SanitizedVitals {
        has_body_composition: vitals.body_mass.is_some()
            || vitals.height.is_some()
            || vitals.body_fat_percentage.is_some()
            || vitals.lean_body_mass.is_some(),
        has_heart_data: vitals.resting_heart_rate.is_some()
            || vitals.heart_rate_variability.is_some()
            || vitals.heart_rate.is_some(),
        has_activity_data: vitals.step_count.is_some()
            || vitals.active_energy_burned.is_some()
            || vitals.exercise_time.is_some(),
        has_distance_data: vitals.walking_running_distance.is_some()
            || vitals.cycling_distance.is_some(),
        has_vo2max: vitals.vo2_max.is_some(),
        vo2max_level: fitness_level(vitals.vo2_max),
        resting_hr_level: vitals.resting_heart_rate.map(resting_hr_level),
    }
}

fn fitness_level(vo2_max: Option<f64>) -> FitnessLevel {
    match vo2_max {
        None => FitnessLevel::Unknown,
        Some(v) if v > VO2MAX_HIGH => FitnessLevel::High,
        Some(v) if v > VO2MAX_MODERATE => FitnessLevel::Moderate,
        Some(_) => FitnessLevel::Low,
    }
}

fn resting_hr_level(bpm: f64) -> RestingHrLevel {
    if bpm < RESTING_HR_ATHLETE {
        RestingHrLevel::Athlete
    } else if bpm < RESTING_HR_GOOD {
        RestingHrLevel::Good
    } else {
        RestingHrLevel::Average
    }
}
