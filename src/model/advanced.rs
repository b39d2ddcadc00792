//! Advanced-analysis payload, returned only by `/api/analyze/advanced`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedAnalysis {
    #[serde(deserialize_with = "lenient::or_default")]
    pub statistics: ConversationStatistics,
    #[serde(deserialize_with = "lenient::or_default")]
    pub deep_emotions: DeepEmotionAnalysis,
    #[serde(deserialize_with = "lenient::or_default")]
    pub patterns: ConversationPatterns,
    #[serde(deserialize_with = "lenient::or_default")]
    pub key_moments: Vec<KeyMoment>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub relationship_prediction: RelationshipPrediction,
    #[serde(deserialize_with = "lenient::or_default")]
    pub topic_clusters: Vec<TopicCluster>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Message counts and activity figures.
///
/// The service guarantees only `my_messages <= total_messages`; the partner
/// share shown to the user is always derived from those two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationStatistics {
    #[serde(deserialize_with = "lenient::count")]
    pub total_messages: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub my_messages: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub partner_messages: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub avg_response_time_minutes: f64,
    #[serde(deserialize_with = "lenient::small_count")]
    pub most_active_hour: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub emoji_count: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub photo_count: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub link_count: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub daily_average_messages: f64,
}

impl ConversationStatistics {
    /// Complementary `(mine, partner)` percentages.
    ///
    /// `mine` is rounded from `my_messages / total_messages`; `partner` is
    /// always `100 - mine`. An empty conversation yields `(0, 100)`.
    pub fn message_ratio(&self) -> (u32, u32) {
        if self.total_messages == 0 {
            return (0, 100);
        }
        let mine = (self.my_messages as f64 / self.total_messages as f64 * 100.0).round();
        let mine = mine.clamp(0.0, 100.0) as u32;
        (mine, 100 - mine)
    }

    /// Partner message count as shown under the ratio bar.
    pub fn partner_message_count(&self) -> u64 {
        self.total_messages.saturating_sub(self.my_messages)
    }
}

// ---------------------------------------------------------------------------
// Emotions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepEmotionAnalysis {
    #[serde(deserialize_with = "lenient::or_default")]
    pub emotions: EmotionScores,
    #[serde(deserialize_with = "lenient::or_default")]
    pub emotion_timeline: Vec<EmotionTimelinePoint>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub emotion_triggers: Vec<EmotionTrigger>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionScores {
    #[serde(deserialize_with = "lenient::or_default")]
    pub joy: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub sadness: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub anger: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub fear: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub surprise: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub disgust: f64,
}

impl EmotionScores {
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("Joy", self.joy),
            ("Sadness", self.sadness),
            ("Anger", self.anger),
            ("Fear", self.fear),
            ("Surprise", self.surprise),
            ("Disgust", self.disgust),
        ]
    }

    /// Highest-scoring emotion; ties resolve to the earlier entry.
    pub fn dominant(&self) -> (&'static str, f64) {
        self.entries()
            .into_iter()
            .fold(("Joy", f64::MIN), |best, (name, score)| {
                if score > best.1 { (name, score) } else { best }
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionTimelinePoint {
    #[serde(deserialize_with = "lenient::or_default")]
    pub period: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub dominant_emotion: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub intensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionTrigger {
    #[serde(deserialize_with = "lenient::or_default")]
    pub emotion: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub trigger: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub context: String,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationPatterns {
    /// Share of conversations started by the uploader, 0–100.
    #[serde(deserialize_with = "lenient::or_default")]
    pub initiative_ratio: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub question_ratio: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub empathy_score: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub formality_level: FormalityLevel,
    #[serde(deserialize_with = "lenient::or_default")]
    pub response_pattern: ResponsePattern,
    #[serde(deserialize_with = "lenient::or_default")]
    pub conversation_depth: ConversationDepth,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormalityLevel {
    Formal,
    Informal,
    Mixed,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePattern {
    Quick,
    Normal,
    Delayed,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationDepth {
    Shallow,
    Moderate,
    Deep,
    #[default]
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Key moments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMoment {
    #[serde(rename = "type")]
    #[serde(deserialize_with = "lenient::or_default")]
    pub kind: KeyMomentKind,
    #[serde(deserialize_with = "lenient::or_default")]
    pub period: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: String,
    /// 1–10.
    #[serde(deserialize_with = "lenient::or_default")]
    pub impact_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMomentKind {
    Highlight,
    Conflict,
    Resolution,
    TurningPoint,
    #[default]
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Prediction and topics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipPrediction {
    #[serde(deserialize_with = "lenient::or_default")]
    pub trend: PredictionTrend,
    #[serde(deserialize_with = "lenient::or_default")]
    pub confidence: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub factors: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTrend {
    Improving,
    Stable,
    Declining,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicCluster {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub frequency: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub sentiment: TopicSentiment,
    #[serde(deserialize_with = "lenient::or_default")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicSentiment {
    Positive,
    Neutral,
    Negative,
    #[default]
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

macro_rules! display_snake_case {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $text),)+
                }
            }
        }
    };
}

display_snake_case!(FormalityLevel { Formal => "formal", Informal => "informal", Mixed => "mixed", Unknown => "unknown" });
display_snake_case!(ResponsePattern { Quick => "quick", Normal => "normal", Delayed => "delayed", Unknown => "unknown" });
display_snake_case!(ConversationDepth { Shallow => "shallow", Moderate => "moderate", Deep => "deep", Unknown => "unknown" });
display_snake_case!(KeyMomentKind {
    Highlight => "highlight",
    Conflict => "conflict",
    Resolution => "resolution",
    TurningPoint => "turning point",
    Unknown => "moment",
});
display_snake_case!(PredictionTrend { Improving => "improving", Stable => "stable", Declining => "declining", Unknown => "unknown" });
display_snake_case!(TopicSentiment { Positive => "positive", Neutral => "neutral", Negative => "negative", Unknown => "unknown" });

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total: u64, mine: u64) -> ConversationStatistics {
        ConversationStatistics {
            total_messages: total,
            my_messages: mine,
            ..Default::default()
        }
    }

    #[test]
    fn message_ratio_is_complementary() {
        assert_eq!(stats(200, 120).message_ratio(), (60, 40));
        assert_eq!(stats(3, 1).message_ratio(), (33, 67));
        assert_eq!(stats(10, 10).message_ratio(), (100, 0));
    }

    #[test]
    fn message_ratio_of_empty_conversation() {
        assert_eq!(stats(0, 0).message_ratio(), (0, 100));
    }

    #[test]
    fn partner_count_is_derived_from_total() {
        let mut s = stats(50, 20);
        s.partner_messages = 999;
        assert_eq!(s.partner_message_count(), 30);
    }

    #[test]
    fn dominant_emotion_picks_highest() {
        let scores = EmotionScores {
            joy: 40.0,
            surprise: 75.0,
            anger: 10.0,
            ..Default::default()
        };
        assert_eq!(scores.dominant(), ("Surprise", 75.0));
    }

    #[test]
    fn deserializes_advanced_payload() {
        let json = r#"{
            "statistics": { "total_messages": 100, "my_messages": 45, "daily_average_messages": 12.5 },
            "patterns": { "formality_level": "informal", "response_pattern": "quick", "conversation_depth": "deep" },
            "key_moments": [
                { "type": "turning_point", "period": "mid", "description": "made up", "impact_score": 8, "quote": "sorry" },
                { "type": "celebration", "period": "late", "description": "?", "impact_score": 3 }
            ],
            "relationship_prediction": { "trend": "improving", "confidence": 70, "factors": ["a"], "recommendations": [] },
            "topic_clusters": [ { "name": "food", "frequency": 40, "sentiment": "positive", "keywords": ["ramen"] } ]
        }"#;
        let adv: AdvancedAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(adv.statistics.message_ratio(), (45, 55));
        assert_eq!(adv.patterns.formality_level, FormalityLevel::Informal);
        assert_eq!(adv.patterns.conversation_depth, ConversationDepth::Deep);
        assert_eq!(adv.key_moments[0].kind, KeyMomentKind::TurningPoint);
        assert_eq!(adv.key_moments[0].quote.as_deref(), Some("sorry"));
        assert_eq!(adv.key_moments[1].kind, KeyMomentKind::Unknown);
        assert_eq!(adv.relationship_prediction.trend, PredictionTrend::Improving);
        assert_eq!(adv.topic_clusters[0].sentiment, TopicSentiment::Positive);
    }

    #[test]
    fn display_names() {
        assert_eq!(KeyMomentKind::TurningPoint.to_string(), "turning point");
        assert_eq!(PredictionTrend::Declining.to_string(), "declining");
    }
}
