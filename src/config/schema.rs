/// Configuration schema and defaults for chatlens.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[server]`, `[upload]`, `[history]`, `[logging]`, and `[web]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level chatlens configuration.
///
/// Maps directly to the `~/.chatlens/config.toml` and `.chatlens.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatlensConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Which analysis endpoint a submission goes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// `POST /api/analyze`: the legacy flow, no `advanced_analysis`.
    Basic,
    /// `POST /api/analyze/advanced`: populates `advanced_analysis`.
    #[default]
    Advanced,
}

impl AnalysisMode {
    /// Endpoint path relative to the server base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Basic => "/api/analyze",
            Self::Advanced => "/api/analyze/advanced",
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// Remote analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the analysis service (endpoints are appended).
    pub base_url: String,
    /// Request timeout in milliseconds. Analyses typically take 10–20 s.
    pub timeout_ms: u64,
    /// Default analysis endpoint: `basic` or `advanced`.
    pub mode: AnalysisMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 120_000,
            mode: AnalysisMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// [upload]
// ---------------------------------------------------------------------------

/// Upload state machine pacing.
///
/// The progress values are presentation checkpoints, not measured byte
/// progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Filename suffix an export file must end with.
    pub accepted_extension: String,
    /// Progress shown as soon as an upload starts.
    pub uploading_progress: u8,
    /// Progress shown once the request is in flight.
    pub analyzing_progress: u8,
    /// Pause between the uploading and analyzing checkpoints (milliseconds).
    pub upload_delay_ms: u64,
    /// Pause after completion before the result is handed to the renderer.
    pub completion_delay_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_extension: ".txt".to_string(),
            uploading_progress: 30,
            analyzing_progress: 60,
            upload_delay_ms: 300,
            completion_delay_ms: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// [history]
// ---------------------------------------------------------------------------

/// Durable history storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Storage slot for the history cache. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: "~/.chatlens/chat-analyzer-storage.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether upload attempts are recorded.
    pub enabled: bool,
    /// Path to the JSONL event log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.chatlens/events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl ChatlensConfig {
    /// Annotated default config written by `chatlens config init`.
    pub fn default_toml() -> String {
        r#"# chatlens configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CHATLENS_*)
#   2. Project config (.chatlens.toml in current directory)
#   3. User global config (~/.chatlens/config.toml)
#   4. Built-in defaults

[server]
base_url = "http://localhost:8000"
timeout_ms = 120000
mode = "advanced"             # basic | advanced

[upload]
accepted_extension = ".txt"
uploading_progress = 30
analyzing_progress = 60
upload_delay_ms = 300
completion_delay_ms = 500

[history]
path = "~/.chatlens/chat-analyzer-storage.json"

[logging]
enabled = true
path = "~/.chatlens/events.jsonl"

[web]
addr = "127.0.0.1:9747"
open_browser = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
