//! Terminal rendering of analysis results, history and upload progress.
//!
//! Every renderer returns a `String` so the CLI decides where it goes.
//! Colors come from `colored` and respect `NO_COLOR` / non-tty output.

use std::fmt::Display;

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};

use crate::history::AnalysisHistoryItem;
use crate::model::{
    AdvancedAnalysis, AnalysisResult, KeyMomentKind, PredictionTrend, TopicSentiment,
    ValidationReport,
};
use crate::upload::{UploadState, UploadStatus};

const RULE_WIDTH: usize = 60;
const BAR_WIDTH: usize = 20;

fn line(out: &mut String, text: impl Display) {
    out.push_str(&text.to_string());
    out.push('\n');
}

fn heading(out: &mut String, title: &str) {
    line(out, "");
    line(out, title.bold().cyan());
}

// ---------------------------------------------------------------------------
// Analysis cards
// ---------------------------------------------------------------------------

/// The full dashboard for one result: basic cards, then the advanced cards
/// when the result carries them.
pub fn analysis(result: &AnalysisResult) -> String {
    let me = result.display_my_name();
    let partner = result.display_partner_name();
    let mut out = String::new();

    line(
        &mut out,
        format!("Conversation with {partner}").bold().cyan(),
    );
    line(&mut out, "=".repeat(RULE_WIDTH));
    if !result.summary.is_empty() {
        line(&mut out, format!("  {}", result.summary));
    }

    heading(&mut out, "Sentiment");
    line(
        &mut out,
        format!(
            "  {:<12} {:>5.0}  {}",
            me,
            result.my_sentiment_score,
            result.my_sentiment_desc.dimmed()
        ),
    );
    line(
        &mut out,
        format!(
            "  {:<12} {:>5.0}  {}",
            partner,
            result.partner_sentiment_score,
            result.partner_sentiment_desc.dimmed()
        ),
    );
    if !result.relationship_change.is_empty() {
        line(
            &mut out,
            format!("  {} {}", "Change:".bold(), result.relationship_change),
        );
    }

    if !result.sentiment_graph.is_empty() {
        heading(&mut out, "Sentiment Over Time");
        line(
            &mut out,
            format!("  {:<12} {:>6} {:>8}", "Period", truncate(me, 6), truncate(partner, 8)),
        );
        // Points are already time-ordered; never sort.
        for point in &result.sentiment_graph {
            line(
                &mut out,
                format!(
                    "  {:<12} {:>6.0} {:>8.0}",
                    truncate(&point.time, 12),
                    point.me,
                    point.partner
                ),
            );
        }
    }

    heading(&mut out, "Communication Style");
    for (axis, value) in result.communication_style.axes() {
        line(
            &mut out,
            format!("  {:<10} {} {:>3.0}", axis, bar(value, BAR_WIDTH), value),
        );
    }

    if !result.topics.is_empty() {
        heading(&mut out, "Topics");
        line(&mut out, format!("  {}", result.topics.join(" · ")));
    }
    if !result.keywords.is_empty() {
        heading(&mut out, "Keywords");
        let tags: Vec<String> = result.keywords.iter().map(|k| format!("#{k}")).collect();
        line(&mut out, format!("  {}", tags.join(" ")));
    }
    if !result.advice.is_empty() {
        heading(&mut out, "Advice");
        line(&mut out, format!("  {}", result.advice));
    }

    if let Some(advanced) = &result.advanced_analysis {
        out.push_str(&advanced_cards(advanced, me, partner));
    }

    out
}

fn advanced_cards(advanced: &AdvancedAnalysis, me: &str, partner: &str) -> String {
    let mut out = String::new();

    let stats = &advanced.statistics;
    let (mine, theirs) = stats.message_ratio();
    heading(&mut out, "Conversation Statistics");
    line(
        &mut out,
        format!(
            "  {} {}   {} {:.1}/day",
            "Messages:".bold(),
            format_number(stats.total_messages),
            "Average:".bold(),
            stats.daily_average_messages
        ),
    );
    line(
        &mut out,
        format!(
            "  {me} {mine}% ({}) {} {theirs}% ({}) {partner}",
            format_number(stats.my_messages),
            ratio_bar(mine, BAR_WIDTH),
            format_number(stats.partner_message_count()),
        ),
    );
    line(
        &mut out,
        format!(
            "  Reply time {:.0} min · busiest hour {:02}:00 · {} emoji · {} photos · {} links",
            stats.avg_response_time_minutes,
            stats.most_active_hour,
            stats.emoji_count,
            stats.photo_count,
            stats.link_count
        ),
    );

    let emotions = &advanced.deep_emotions;
    heading(&mut out, "Emotions");
    for (name, score) in emotions.emotions.entries() {
        line(
            &mut out,
            format!("  {:<10} {} {:>3.0}", name, bar(score, BAR_WIDTH), score),
        );
    }
    let (dominant, _) = emotions.emotions.dominant();
    line(&mut out, format!("  {} {}", "Dominant:".bold(), dominant));
    for point in &emotions.emotion_timeline {
        line(
            &mut out,
            format!(
                "  {:<12} {:<10} {:>3.0}",
                truncate(&point.period, 12),
                point.dominant_emotion,
                point.intensity
            )
            .dimmed(),
        );
    }
    for trigger in &emotions.emotion_triggers {
        line(
            &mut out,
            format!(
                "  {} ← {} {}",
                trigger.emotion.bold(),
                trigger.trigger,
                format!("({})", trigger.context).dimmed()
            ),
        );
    }

    let patterns = &advanced.patterns;
    heading(&mut out, "Patterns");
    line(
        &mut out,
        format!(
            "  Initiative {:.0}% · questions {:.0}% · empathy {:.0}",
            patterns.initiative_ratio, patterns.question_ratio, patterns.empathy_score
        ),
    );
    line(
        &mut out,
        format!(
            "  Formality {} · responses {} · depth {}",
            patterns.formality_level, patterns.response_pattern, patterns.conversation_depth
        ),
    );

    if !advanced.key_moments.is_empty() {
        heading(&mut out, "Key Moments");
        for moment in &advanced.key_moments {
            line(
                &mut out,
                format!(
                    "  {} {:<10} {} {}",
                    moment_marker(moment.kind),
                    truncate(&moment.period, 10),
                    moment.description,
                    format!("[{:.0}/10]", moment.impact_score).dimmed()
                ),
            );
            if let Some(quote) = &moment.quote {
                line(&mut out, format!("      \"{quote}\"").italic());
            }
        }
    }

    let prediction = &advanced.relationship_prediction;
    heading(&mut out, "Outlook");
    line(
        &mut out,
        format!(
            "  {} ({:.0}% confidence)",
            colorize_trend(prediction.trend),
            prediction.confidence
        ),
    );
    for factor in &prediction.factors {
        line(&mut out, format!("  · {factor}"));
    }
    for recommendation in &prediction.recommendations {
        line(&mut out, format!("  → {recommendation}"));
    }

    if !advanced.topic_clusters.is_empty() {
        heading(&mut out, "Topic Clusters");
        for cluster in &advanced.topic_clusters {
            line(
                &mut out,
                format!(
                    "  {:<16} {:>5.0}% {}  {}",
                    truncate(&cluster.name, 16),
                    cluster.frequency,
                    colorize_sentiment(cluster.sentiment),
                    cluster.keywords.join(", ").dimmed()
                ),
            );
        }
    }

    out
}

fn moment_marker(kind: KeyMomentKind) -> ColoredString {
    match kind {
        KeyMomentKind::Highlight => "★".yellow(),
        KeyMomentKind::Conflict => "✗".red(),
        KeyMomentKind::Resolution => "✓".green(),
        KeyMomentKind::TurningPoint => "↻".blue(),
        KeyMomentKind::Unknown => "·".normal(),
    }
}

fn colorize_trend(trend: PredictionTrend) -> ColoredString {
    let text = trend.to_string();
    match trend {
        PredictionTrend::Improving => text.green().bold(),
        PredictionTrend::Stable => text.blue().bold(),
        PredictionTrend::Declining => text.red().bold(),
        PredictionTrend::Unknown => text.normal(),
    }
}

fn colorize_sentiment(sentiment: TopicSentiment) -> ColoredString {
    let text = sentiment.to_string();
    match sentiment {
        TopicSentiment::Positive => text.green(),
        TopicSentiment::Neutral => text.normal(),
        TopicSentiment::Negative => text.red(),
        TopicSentiment::Unknown => text.dimmed(),
    }
}

// ---------------------------------------------------------------------------
// History, progress, validation
// ---------------------------------------------------------------------------

pub fn history_list(items: &[AnalysisHistoryItem]) -> String {
    let mut out = String::new();
    if items.is_empty() {
        line(&mut out, "No saved analyses yet.".yellow());
        return out;
    }

    line(&mut out, "Analysis History".bold().cyan());
    line(&mut out, "=".repeat(RULE_WIDTH));
    line(
        &mut out,
        format!("  {:<14} {:<17} {:<12} Summary", "Id", "Date", "Partner"),
    );
    line(&mut out, format!("  {}", "-".repeat(RULE_WIDTH - 2)));
    for (i, item) in items.iter().enumerate() {
        let row = format!(
            "  {:<14} {:<17} {:<12} {}",
            item.id,
            local_date(&item.date),
            truncate(&item.partner_name, 12),
            truncate(&item.summary, 30)
        );
        if i % 2 == 0 {
            line(&mut out, row);
        } else {
            line(&mut out, row.dimmed());
        }
    }
    out
}

/// One-line status for an upload transition.
pub fn progress_line(state: &UploadState) -> String {
    let label = match state.status() {
        UploadStatus::Idle => "Ready".normal(),
        UploadStatus::Uploading => "Uploading file...".cyan(),
        UploadStatus::Analyzing => "AI is analyzing the conversation...".cyan(),
        UploadStatus::Complete => "Analysis complete!".green().bold(),
        UploadStatus::Error => state.error().unwrap_or_default().red().bold(),
    };
    format!(
        "[{}] {:>3}% {}",
        bar(f64::from(state.progress()), BAR_WIDTH),
        state.progress(),
        label
    )
}

pub fn validation(file_name: &str, report: &ValidationReport) -> String {
    if report.valid {
        let count = report
            .message_count
            .map(|n| format!(" ({} messages)", format_number(n)))
            .unwrap_or_default();
        format!("{} {file_name} is a usable export{count}", "✓".green().bold())
    } else {
        let reason = report.error.as_deref().unwrap_or("not a recognized chat export");
        format!("{} {file_name}: {reason}", "✗".red().bold())
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate to `max_len` characters, appending "…" if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// A 0–100 value as a fixed-width bar. Out-of-range values are drawn
/// clamped; the number printed beside the bar stays as received.
pub fn bar(value: f64, width: usize) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn ratio_bar(mine: u32, width: usize) -> String {
    let filled = (mine as usize * width + 50) / 100;
    format!(
        "{}{}",
        "█".repeat(filled).blue(),
        "█".repeat(width - filled).magenta()
    )
}

/// RFC 3339 timestamp in local time, or the raw text if it does not parse.
pub fn local_date(rfc3339: &str) -> String {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversationStatistics, KeyMoment, SentimentPoint};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("김민수입니다", 3), "김민…");
    }

    #[test]
    fn bar_clamps_out_of_range_values() {
        assert_eq!(bar(0.0, 4), "░░░░");
        assert_eq!(bar(50.0, 4), "██░░");
        assert_eq!(bar(250.0, 4), "████");
        assert_eq!(bar(-3.0, 4), "░░░░");
    }

    #[test]
    fn unparseable_date_is_shown_raw() {
        assert_eq!(local_date("yesterday"), "yesterday");
        assert_eq!(local_date("2026-03-01T10:00:00+00:00").len(), 16);
    }

    #[test]
    fn analysis_uses_fallback_names_and_keeps_graph_order() {
        plain();
        let result = AnalysisResult {
            summary: "warm chat".to_string(),
            sentiment_graph: vec![
                SentimentPoint {
                    time: "late".to_string(),
                    me: 90.0,
                    partner: 80.0,
                },
                SentimentPoint {
                    time: "early".to_string(),
                    me: 10.0,
                    partner: 20.0,
                },
            ],
            ..Default::default()
        };
        let text = analysis(&result);
        assert!(text.contains("Conversation with partner"));
        assert!(text.contains("  me "));
        let late = text.find("late").unwrap();
        let early = text.find("early").unwrap();
        assert!(late < early);
        assert!(!text.contains("Conversation Statistics"));
    }

    #[test]
    fn advanced_cards_show_complementary_ratio() {
        plain();
        let result = AnalysisResult {
            my_name: "지수".to_string(),
            partner_name: "민수".to_string(),
            advanced_analysis: Some(AdvancedAnalysis {
                statistics: ConversationStatistics {
                    total_messages: 1000,
                    my_messages: 420,
                    ..Default::default()
                },
                key_moments: vec![KeyMoment {
                    description: "first trip".to_string(),
                    quote: Some("let's go".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = analysis(&result);
        assert!(text.contains("지수 42% (420)"));
        assert!(text.contains("58% (580) 민수"));
        assert!(text.contains("first trip"));
        assert!(text.contains("\"let's go\""));
    }

    #[test]
    fn progress_line_shows_error_message() {
        plain();
        let mut machine = crate::upload::UploadMachine::default();
        let _ = machine.select_file(crate::upload::StagedFile::new("a.csv", ""));
        let text = progress_line(machine.state());
        assert!(text.contains("Only chat export files (.txt) can be uploaded."));
        assert!(text.contains("  0%"));
    }

    #[test]
    fn empty_history_message() {
        plain();
        assert!(history_list(&[]).contains("No saved analyses yet."));
    }

    #[test]
    fn validation_lines() {
        plain();
        let ok = ValidationReport {
            valid: true,
            message_count: Some(1200),
            error: None,
        };
        assert!(validation("chat.txt", &ok).contains("(1,200 messages)"));
        let bad = ValidationReport {
            valid: false,
            message_count: None,
            error: Some("no timestamps".to_string()),
        };
        assert!(validation("chat.txt", &bad).contains("no timestamps"));
    }
}
