//! Shape of the analysis service's response.
//!
//! The client treats an [`AnalysisResult`] as an immutable value once
//! received. Deserialization is lenient (absent or `null` fields default to
//! empty or zero, counts may be floats) and nothing is clamped or
//! range-checked: scores are rendered as the service sent them.

use serde::{Deserialize, Serialize};

pub mod advanced;
mod lenient;

pub use advanced::{
    AdvancedAnalysis, ConversationDepth, ConversationPatterns, ConversationStatistics,
    DeepEmotionAnalysis, EmotionScores, EmotionTimelinePoint, EmotionTrigger, FormalityLevel,
    KeyMoment, KeyMomentKind, PredictionTrend, RelationshipPrediction, ResponsePattern,
    TopicCluster, TopicSentiment,
};

/// Display name used when the service could not identify the uploader.
pub const DEFAULT_MY_NAME: &str = "me";

/// Display name used when the service could not identify the partner.
pub const DEFAULT_PARTNER_NAME: &str = "partner";

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

/// Full result of one analysis, as returned by `/api/analyze` or
/// `/api/analyze/advanced`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "lenient::or_default")]
    pub partner_name: String,
    /// May be empty; see [`AnalysisResult::display_my_name`].
    #[serde(deserialize_with = "lenient::or_default")]
    pub my_name: String,

    /// Expected 0–100, not enforced.
    #[serde(deserialize_with = "lenient::or_default")]
    pub my_sentiment_score: f64,
    /// Expected 0–100, not enforced.
    #[serde(deserialize_with = "lenient::or_default")]
    pub partner_sentiment_score: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub my_sentiment_desc: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub partner_sentiment_desc: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub relationship_change: String,

    /// Time-ordered; used as chart categories without re-sorting.
    #[serde(deserialize_with = "lenient::or_default")]
    pub sentiment_graph: Vec<SentimentPoint>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub communication_style: CommunicationStyle,

    #[serde(deserialize_with = "lenient::or_default")]
    pub topics: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub advice: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub summary: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub keywords: Vec<String>,

    /// Only populated by the advanced endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_analysis: Option<AdvancedAnalysis>,
}

impl AnalysisResult {
    /// Uploader's name, or [`DEFAULT_MY_NAME`] when the service left it blank.
    pub fn display_my_name(&self) -> &str {
        non_blank_or(&self.my_name, DEFAULT_MY_NAME)
    }

    /// Partner's name, or [`DEFAULT_PARTNER_NAME`] when blank.
    pub fn display_partner_name(&self) -> &str {
        non_blank_or(&self.partner_name, DEFAULT_PARTNER_NAME)
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced_analysis.is_some()
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// One point of the sentiment-over-time chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentPoint {
    /// Category label (e.g. "early", "mid", "late").
    #[serde(deserialize_with = "lenient::or_default")]
    pub time: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub me: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub partner: f64,
}

/// Fixed five-axis communication profile, each axis 0–100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationStyle {
    #[serde(deserialize_with = "lenient::or_default")]
    pub affection: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub humor: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub trust: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub conflict: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub frequency: f64,
}

impl CommunicationStyle {
    /// Axes in radar-chart order.
    pub fn axes(&self) -> [(&'static str, f64); 5] {
        [
            ("Affection", self.affection),
            ("Humor", self.humor),
            ("Trust", self.trust),
            ("Conflict", self.conflict),
            ("Frequency", self.frequency),
        ]
    }
}

// ---------------------------------------------------------------------------
// Validation endpoint
// ---------------------------------------------------------------------------

/// Response of `POST /api/validate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
