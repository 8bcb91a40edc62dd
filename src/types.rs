//! Core request, clinical-data, and reply types.
//!
//! Wire names follow the caller-facing JSON contract (`userIdentity`,
//! `conversationHistory`, `bloodData`, ...). Everything here is created
//! fresh per request and dropped once the reply is returned; nothing is
//! persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction or rendered data context.
    System,
    /// Human user message.
    User,
    /// Assistant (LLM) message.
    Assistant,
}

impl Role {
    /// The lowercase wire name for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged unit of a conversation — a history turn on the way in,
/// a prompt message on the way out. Order is preserved end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// Plain text content.
    pub content: String,
}

impl Message {
    /// Convenience constructor for a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Convenience constructor for a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound request
// ---------------------------------------------------------------------------

/// One chat invocation as supplied by the caller. Immutable for the
/// lifetime of the request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Opaque user identity. Pseudonymized before leaving the trust
    /// boundary, never forwarded raw.
    #[serde(default, alias = "userId")]
    pub user_identity: String,
    /// Free-text question.
    #[serde(default)]
    pub message: String,
    /// Consultation topic hint.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Prior turns, oldest first. The caller supplies full history each
    /// turn; this service stores no conversation state.
    #[serde(default)]
    pub conversation_history: Vec<Message>,
    /// Lab panel items, if the user shared them for this turn.
    #[serde(default, alias = "bloodPanel")]
    pub blood_data: Option<Vec<LabItem>>,
    /// Wearable vitals snapshot, if shared.
    #[serde(default, alias = "vitalSnapshot")]
    pub vital_data: Option<VitalSnapshot>,
    /// Genetic marker data, if shared.
    #[serde(default)]
    pub gene_data: Option<GeneData>,
}

fn default_topic() -> String {
    "general_health".to_owned()
}

// ---------------------------------------------------------------------------
// Blood panel
// ---------------------------------------------------------------------------

/// Canonical lab-result status bucket.
///
/// Incoming vocabulary (Japanese and English, any case) is normalized to
/// this enum once at the deserialization boundary; renderers never match
/// raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabStatus {
    /// Within the reference range.
    Normal,
    /// Borderline, worth watching.
    Caution,
    /// Outside the reference range.
    Abnormal,
}

impl LabStatus {
    /// Normalize a raw status token. Unrecognized tokens are treated as
    /// abnormal so that suspect values are surfaced rather than hidden.
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim().to_lowercase();
        match token.as_str() {
            "正常" | "normal" => Self::Normal,
            "注意" | "要注意" | "caution" => Self::Caution,
            _ => Self::Abnormal,
        }
    }
}

impl<'de> Deserialize<'de> for LabStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One lab panel item as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabItem {
    /// Internal item identifier. Dropped by sanitization.
    #[serde(default)]
    pub key: String,
    /// Human-readable item name.
    #[serde(default, alias = "nameJp", alias = "name")]
    pub display_name: String,
    /// Measured value. Accepts numeric or string JSON.
    #[serde(default)]
    pub value: serde_json::Value,
    /// Measurement unit.
    #[serde(default)]
    pub unit: String,
    /// Reference range as free text.
    #[serde(default, alias = "reference")]
    pub reference_range: String,
    /// Normalized status bucket.
    #[serde(default = "default_status")]
    pub status: LabStatus,
}

fn default_status() -> LabStatus {
    LabStatus::Abnormal
}

// ---------------------------------------------------------------------------
// Gene data
// ---------------------------------------------------------------------------

/// Aggregate impact of the SNPs behind one marker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkerImpact {
    /// Count of protective genotypes.
    #[serde(default)]
    pub protective: i64,
    /// Count of risk genotypes.
    #[serde(default)]
    pub risk: i64,
    /// Count of neutral genotypes.
    #[serde(default)]
    pub neutral: i64,
    /// Net impact score.
    #[serde(default)]
    pub score: i64,
}

/// One genetic data point.
///
/// Markers arrive in two stages: metadata-only (title populated, nothing
/// else) and full-data (genotypes and impact populated). Both stages can
/// appear under the same category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneMarker {
    /// Marker title.
    #[serde(default)]
    pub title: String,
    /// SNP identifier → genotype string. Never leaves the trust boundary.
    #[serde(default)]
    pub genotypes: Option<BTreeMap<String, String>>,
    /// Aggregate impact, when the full-data stage is present.
    #[serde(default)]
    pub impact: Option<MarkerImpact>,
    /// Coarse score label, when precomputed upstream.
    #[serde(default)]
    pub score_level: Option<String>,
}

/// The payload under one gene category: either a single marker object or
/// an ordered list of markers. Modeled as an explicit variant so that the
/// sanitizer and renderer both match exhaustively.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeneCategory {
    /// Category resolved to exactly one marker.
    Single(GeneMarker),
    /// Category resolved to an ordered marker list (possibly empty).
    Many(Vec<GeneMarker>),
}

/// Genetic data for one request.
///
/// The reserved `availableCategories` key lists category names only, with
/// no marker payload; when present and non-empty it replaces marker
/// rendering entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneData {
    /// Reserved key: names of categories the user could request.
    #[serde(default, rename = "availableCategories")]
    pub available_categories: Option<Vec<String>>,
    /// Category name → marker payload.
    #[serde(flatten)]
    pub categories: BTreeMap<String, GeneCategory>,
}

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// Wearable vitals snapshot (most recent window), all fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSnapshot {
    /// Body mass in kg.
    #[serde(default)]
    pub body_mass: Option<f64>,
    /// Height in cm.
    #[serde(default)]
    pub height: Option<f64>,
    /// Body fat fraction (0..1).
    #[serde(default)]
    pub body_fat_percentage: Option<f64>,
    /// Lean body mass in kg.
    #[serde(default)]
    pub lean_body_mass: Option<f64>,
    /// Resting heart rate in bpm.
    #[serde(default)]
    pub resting_heart_rate: Option<f64>,
    /// VO2max in ml/kg/min.
    #[serde(default)]
    pub vo2_max: Option<f64>,
    /// Heart rate variability in ms.
    #[serde(default)]
    pub heart_rate_variability: Option<f64>,
    /// Heart rate in bpm.
    #[serde(default)]
    pub heart_rate: Option<f64>,
    /// Active energy burned in kcal.
    #[serde(default)]
    pub active_energy_burned: Option<f64>,
    /// Exercise minutes.
    #[serde(default)]
    pub exercise_time: Option<f64>,
    /// Step count.
    #[serde(default)]
    pub step_count: Option<f64>,
    /// Walking/running distance in km.
    #[serde(default)]
    pub walking_running_distance: Option<f64>,
    /// Cycling distance in km.
    #[serde(default)]
    pub cycling_distance: Option<f64>,
}

// ---------------------------------------------------------------------------
// Sanitized shapes (derived, never persisted)
// ---------------------------------------------------------------------------

/// A lab item with the internal key dropped; only the allowlisted fields
/// survive.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedLabItem {
    /// Human-readable item name.
    pub name: String,
    /// Measured value rendered as text.
    pub value: String,
    /// Measurement unit.
    pub unit: String,
    /// Reference range.
    pub reference_range: String,
    /// Normalized status bucket.
    pub status: LabStatus,
}

/// A gene marker reduced to title and coarse impact; genotypes and SNP
/// identifiers are gone.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedMarker {
    /// Marker title.
    pub title: String,
    /// Net impact score, present only for the full-data stage. A
    /// metadata-only marker stays `None` even when a full-data score is
    /// zero, so the two stages remain distinguishable downstream.
    pub impact_score: Option<i64>,
    /// Coarse score label, if any.
    pub score_level: Option<String>,
}

/// Sanitized payload under one gene category, preserving the single/list
/// distinction of the input shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SanitizedCategory {
    /// Single marker.
    Single(SanitizedMarker),
    /// Ordered marker list (possibly empty).
    Many(Vec<SanitizedMarker>),
}

/// Sanitized gene data.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedGeneData {
    /// Reserved category-name list, passed through unmodified (it carries
    /// no personal data).
    pub available_categories: Option<Vec<String>>,
    /// Category name → sanitized markers.
    pub categories: BTreeMap<String, SanitizedCategory>,
}

/// Coarse fitness-capacity bucket derived from VO2max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitnessLevel {
    /// VO2max at or below the low threshold.
    Low,
    /// Middle band.
    Moderate,
    /// Above the high threshold.
    High,
    /// No VO2max available.
    Unknown,
}

impl FitnessLevel {
    /// Lowercase label used in rendered context.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

/// Coarse resting-heart-rate bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestingHrLevel {
    /// Below 55 bpm.
    Athlete,
    /// Below 70 bpm.
    Good,
    /// Everything else.
    Average,
}

impl RestingHrLevel {
    /// Lowercase label used in rendered context.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Athlete => "athlete",
            Self::Good => "good",
            Self::Average => "average",
        }
    }
}

/// Vitals collapsed to presence flags and coarse buckets; raw numbers are
/// never forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizedVitals {
    /// Any body-composition field was present.
    pub has_body_composition: bool,
    /// Any cardiac field was present.
    pub has_heart_data: bool,
    /// Any activity field was present.
    pub has_activity_data: bool,
    /// Any distance field was present.
    pub has_distance_data: bool,
    /// A VO2max reading was present.
    pub has_vo2max: bool,
    /// Fitness-capacity bucket.
    pub vo2max_level: FitnessLevel,
    /// Resting-heart-rate bucket, when a reading was present.
    pub resting_hr_level: Option<RestingHrLevel>,
}

/// The redacted request shape handed to the context builder. Derived per
/// request, never persisted. No field may contain a raw SNP identifier,
/// raw user identity, email, phone number, or unredacted free-text date.
#[derive(Debug, Clone)]
pub struct SanitizedRequest {
    /// Pseudonymous, salt-derived token standing in for the identity.
    pub user_token: String,
    /// Redacted question text.
    pub message: String,
    /// Consultation topic hint.
    pub topic: String,
    /// Redacted history, original order and roles.
    pub history: Vec<Message>,
    /// Allowlisted blood panel.
    pub blood_panel: Option<Vec<SanitizedLabItem>>,
    /// Sanitized gene data.
    pub gene_data: Option<SanitizedGeneData>,
    /// Collapsed vitals.
    pub vitals: Option<SanitizedVitals>,
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// The caller-facing success reply.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Full generated text (kept for backward compatibility with callers
    /// that do not consume chunks).
    #[serde(rename = "response")]
    pub raw_text: String,
    /// Ordered display chunks, one per answer section.
    pub chunks: Vec<String>,
    /// Always true; signals that `chunks` is authoritative.
    pub chunked: bool,
    /// Reply creation time, UTC.
    pub timestamp: DateTime<Utc>,
    /// Fixed medical disclaimer appended to every reply.
    pub disclaimer: String,
}
