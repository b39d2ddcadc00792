//! Append-only JSONL event log (`~/.chatlens/events.jsonl`).
//!
//! One line per finished upload attempt plus occasional warnings. Writing is
//! best-effort: failures are silently ignored so logging never interferes
//! with an upload.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;
use crate::config::{self, AnalysisMode};

pub mod report;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A single line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub timestamp: String,
    /// `"attempt"` or `"warning"`.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Final upload status of an attempt (`complete` / `error`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Outcome of one upload attempt, as recorded in the log.
#[derive(Debug, Clone)]
pub struct AttemptRecord<'a> {
    pub file_name: &'a str,
    pub mode: AnalysisMode,
    pub status: &'a str,
    pub progress: u8,
    pub error: Option<&'a str>,
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Destination of the event log; `None` disables logging.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: config::expand_home(&config.path),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log_attempt(&self, record: &AttemptRecord<'_>) {
        let entry = EventEntry {
            timestamp: Utc::now().to_rfc3339(),
            kind: "attempt".to_string(),
            file_name: Some(record.file_name.to_string()),
            mode: Some(record.mode.to_string()),
            status: Some(record.status.to_string()),
            progress: Some(record.progress),
            message: record.error.map(str::to_string),
            latency_ms: Some(record.latency_ms),
        };
        self.append(&entry);
    }

    pub fn log_warning(&self, message: &str) {
        let entry = EventEntry {
            timestamp: Utc::now().to_rfc3339(),
            kind: "warning".to_string(),
            file_name: None,
            mode: None,
            status: None,
            progress: None,
            message: Some(message.to_string()),
            latency_ms: None,
        };
        self.append(&entry);
    }

    /// Every readable entry; malformed lines are skipped and a missing file
    /// is an empty log.
    pub fn read_all(&self) -> Vec<EventEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<EventEntry>(&line).ok())
            .collect()
    }

    /// Entries from the last `days` days, or all when `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<EventEntry> {
        let entries = self.read_all();
        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }

    fn append(&self, entry: &EventEntry) {
        let _ = self.try_append(entry);
    }

    fn try_append(&self, entry: &EventEntry) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
