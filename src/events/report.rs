//! Aggregation of the event log for `chatlens stats`.

use std::collections::HashMap;

use super::EventEntry;

/// Summary of upload attempts.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttemptStats {
    pub attempts: usize,
    pub completed: usize,
    pub failed: usize,
    /// Average over completed attempts only.
    pub avg_latency_ms: Option<u64>,
    pub basic: usize,
    pub advanced: usize,
    /// `(message, count)`, most frequent first.
    pub top_errors: Vec<(String, usize)>,
}

impl AttemptStats {
    pub fn success_pct(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.completed as f64 / self.attempts as f64 * 100.0
        }
    }
}

pub fn build_stats(entries: &[EventEntry]) -> AttemptStats {
    let attempts: Vec<&EventEntry> = entries.iter().filter(|e| e.kind == "attempt").collect();

    let mut stats = AttemptStats {
        attempts: attempts.len(),
        ..Default::default()
    };

    let mut latency_sum = 0u64;
    let mut errors: HashMap<&str, usize> = HashMap::new();

    for entry in &attempts {
        match entry.status.as_deref() {
            Some("complete") => {
                stats.completed += 1;
                latency_sum += entry.latency_ms.unwrap_or(0);
            }
            Some("error") => {
                stats.failed += 1;
                let message = entry.message.as_deref().unwrap_or("unknown error");
                *errors.entry(message).or_default() += 1;
            }
            _ => {}
        }
        match entry.mode.as_deref() {
            Some("basic") => stats.basic += 1,
            Some("advanced") => stats.advanced += 1,
            _ => {}
        }
    }

    if stats.completed > 0 {
        stats.avg_latency_ms = Some(latency_sum / stats.completed as u64);
    }

    let mut top_errors: Vec<(String, usize)> = errors
        .into_iter()
        .map(|(message, count)| (message.to_string(), count))
        .collect();
    top_errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_errors.truncate(5);
    stats.top_errors = top_errors;

    stats
}
