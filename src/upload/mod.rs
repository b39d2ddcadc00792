//! Upload state machine for a single file submission.
//!
//! ```text
//!   idle ──submit──▶ uploading ──▶ analyzing ──▶ complete
//!    ▲ │                  │             │
//!    │ └─bad suffix─┐     └─────────────┴──────▶ error
//!    └──── reset ───┴──────────────────────────────┘
//! ```
//!
//! File staging is separate from the status: selecting a valid export file
//! stages it and leaves the machine idle. Only one attempt runs at a time;
//! [`UploadMachine::submit`] refuses to start unless the status is idle and
//! a file is staged.

use std::fmt;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::client::AnalysisService;
use crate::config::AnalysisMode;
use crate::config::schema::UploadConfig;
use crate::error::{AnalyzerError, Result};
use crate::model::AnalysisResult;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Complete,
    Error,
}

impl UploadStatus {
    /// Whether a request is (or is about to be) in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Uploading | Self::Analyzing)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Uploading => write!(f, "uploading"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of the machine. `error` is `Some` exactly when `status` is
/// [`UploadStatus::Error`]; the constructors are the only way to build one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadState {
    status: UploadStatus,
    progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl UploadState {
    pub fn idle() -> Self {
        Self::default()
    }

    fn in_phase(status: UploadStatus, progress: u8) -> Self {
        Self {
            status,
            progress: progress.min(100),
            error: None,
        }
    }

    fn complete() -> Self {
        Self::in_phase(UploadStatus::Complete, 100)
    }

    /// Error state. Progress is kept as it was so it never moves backwards
    /// within the failed attempt.
    fn failed(progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: UploadStatus::Error,
            progress,
            error: Some(message.into()),
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Staged file
// ---------------------------------------------------------------------------

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk; the staged name is the path's file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Synthetic progress checkpoints and display delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub accepted_extension: String,
    pub uploading_progress: u8,
    pub analyzing_progress: u8,
    pub upload_delay: Duration,
    pub completion_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

impl Pacing {
    pub fn from_config(config: &UploadConfig) -> Self {
        // Keep the checkpoints ordered even if the config is not.
        let uploading = config.uploading_progress.clamp(1, 99);
        let analyzing = config.analyzing_progress.clamp(uploading, 99);
        Self {
            accepted_extension: config.accepted_extension.clone(),
            uploading_progress: uploading,
            analyzing_progress: analyzing,
            upload_delay: Duration::from_millis(config.upload_delay_ms),
            completion_delay: Duration::from_millis(config.completion_delay_ms),
        }
    }

    /// Same checkpoints, no sleeping.
    pub fn without_delays(mut self) -> Self {
        self.upload_delay = Duration::ZERO;
        self.completion_delay = Duration::ZERO;
        self
    }
}

pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Receives every state the machine enters during [`UploadMachine::submit`].
pub trait UploadObserver {
    fn on_transition(&mut self, state: &UploadState);
}

impl<F: FnMut(&UploadState)> UploadObserver for F {
    fn on_transition(&mut self, state: &UploadState) {
        self(state)
    }
}

/// Observer that ignores every transition.
pub struct NoopObserver;

impl UploadObserver for NoopObserver {
    fn on_transition(&mut self, _state: &UploadState) {}
}

#[derive(Debug, Default)]
pub struct UploadMachine {
    state: UploadState,
    staged: Option<StagedFile>,
    pacing: Pacing,
}

impl UploadMachine {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            state: UploadState::idle(),
            staged: None,
            pacing,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn staged(&self) -> Option<&StagedFile> {
        self.staged.as_ref()
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Stage a file for upload.
    ///
    /// A file whose name lacks the accepted suffix moves the machine to
    /// `error` with the fixed validation message and stages nothing. A valid
    /// file replaces any previously staged one and clears a previous error or
    /// completion back to idle. Refused with [`AnalyzerError::Busy`] while an
    /// attempt is in flight.
    pub fn select_file(&mut self, file: StagedFile) -> Result<()> {
        if self.state.status.is_active() {
            return Err(AnalyzerError::Busy);
        }

        if !file.name.ends_with(&self.pacing.accepted_extension) {
            let err = AnalyzerError::InvalidExtension {
                file_name: file.name,
            };
            self.staged = None;
            self.state = UploadState::failed(0, err.user_message());
            return Err(err);
        }

        self.staged = Some(file);
        self.state = UploadState::idle();
        Ok(())
    }

    /// The submit action is available only when idle with a staged file.
    pub fn can_submit(&self) -> bool {
        self.state.status == UploadStatus::Idle && self.staged.is_some()
    }

    /// Run one attempt: idle → uploading → analyzing → complete | error.
    ///
    /// The observer sees every state entered. A refused submit (nothing
    /// staged, or not idle) returns an error without any transition and
    /// without contacting the service. Remote failures end the attempt in
    /// `error` and are never retried. The completion display pause is left
    /// to the caller, after the result has been published.
    pub fn submit<S, O>(
        &mut self,
        service: &S,
        mode: AnalysisMode,
        observer: &mut O,
    ) -> Result<AnalysisResult>
    where
        S: AnalysisService + ?Sized,
        O: UploadObserver + ?Sized,
    {
        match self.state.status {
            UploadStatus::Idle => {}
            UploadStatus::Uploading | UploadStatus::Analyzing => return Err(AnalyzerError::Busy),
            UploadStatus::Complete | UploadStatus::Error => return Err(AnalyzerError::NotIdle),
        }
        let Some(file) = self.staged.clone() else {
            return Err(AnalyzerError::NoFileStaged);
        };

        self.enter(
            UploadState::in_phase(UploadStatus::Uploading, self.pacing.uploading_progress),
            observer,
        );
        pause(self.pacing.upload_delay);

        self.enter(
            UploadState::in_phase(UploadStatus::Analyzing, self.pacing.analyzing_progress),
            observer,
        );

        match service.analyze(&file, mode) {
            Ok(result) => {
                self.enter(UploadState::complete(), observer);
                Ok(result)
            }
            Err(err) => {
                let failed = UploadState::failed(self.state.progress, err.user_message());
                self.enter(failed, observer);
                Err(err)
            }
        }
    }

    /// Clear the staged file and return to idle with no error or progress.
    pub fn reset(&mut self) {
        self.staged = None;
        self.state = UploadState::idle();
    }

    fn enter<O: UploadObserver + ?Sized>(&mut self, state: UploadState, observer: &mut O) {
        self.state = state;
        observer.on_transition(&self.state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::INVALID_EXTENSION_MESSAGE;
    use crate::model::ValidationReport;

    struct FakeService {
        outcome: std::result::Result<AnalysisResult, (u16, String)>,
        calls: Cell<usize>,
    }

    impl FakeService {
        fn ok(partner: &str) -> Self {
            Self {
                outcome: Ok(AnalysisResult {
                    partner_name: partner.to_string(),
                    ..Default::default()
                }),
                calls: Cell::new(0),
            }
        }

        fn failing(status: u16, message: &str) -> Self {
            Self {
                outcome: Err((status, message.to_string())),
                calls: Cell::new(0),
            }
        }
    }

    impl AnalysisService for FakeService {
        fn analyze(&self, _file: &StagedFile, _mode: AnalysisMode) -> Result<AnalysisResult> {
            self.calls.set(self.calls.get() + 1);
            match &self.outcome {
                Ok(result) => Ok(result.clone()),
                Err((status, message)) => Err(AnalyzerError::Remote {
                    status: *status,
                    message: message.clone(),
                }),
            }
        }

        fn validate(&self, _file: &StagedFile) -> Result<ValidationReport> {
            Ok(ValidationReport::default())
        }
    }

    fn machine() -> UploadMachine {
        UploadMachine::new(Pacing::default().without_delays())
    }

    fn chat_file() -> StagedFile {
        StagedFile::new("chat.txt", "[A] [10:00] hi")
    }

    #[test]
    fn new_machine_is_idle_without_file() {
        let m = machine();
        assert_eq!(m.state(), &UploadState::idle());
        assert!(m.staged().is_none());
        assert!(!m.can_submit());
    }

    #[test]
    fn selecting_valid_file_stages_without_transition() {
        let mut m = machine();
        m.select_file(chat_file()).unwrap();
        assert_eq!(m.state().status(), UploadStatus::Idle);
        assert_eq!(m.staged().map(|f| f.name.as_str()), Some("chat.txt"));
        assert!(m.can_submit());
    }

    #[test]
    fn selecting_wrong_suffix_enters_error() {
        let mut m = machine();
        let err = m
            .select_file(StagedFile::new("chat.csv", "a,b"))
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidExtension { .. }));
        assert_eq!(m.state().status(), UploadStatus::Error);
        assert_eq!(m.state().error(), Some(INVALID_EXTENSION_MESSAGE));
        assert!(m.staged().is_none());
        assert!(!m.can_submit());
    }

    #[test]
    fn suffix_check_is_case_sensitive() {
        let mut m = machine();
        assert!(m.select_file(StagedFile::new("CHAT.TXT", "x")).is_err());
    }

    #[test]
    fn successful_submit_walks_all_phases() {
        let mut m = machine();
        let service = FakeService::ok("민수");
        m.select_file(chat_file()).unwrap();

        let mut seen = Vec::new();
        let result = m
            .submit(&service, AnalysisMode::Advanced, &mut |s: &UploadState| {
                seen.push((s.status(), s.progress()))
            })
            .unwrap();

        assert_eq!(result.partner_name, "민수");
        assert_eq!(
            seen,
            vec![
                (UploadStatus::Uploading, 30),
                (UploadStatus::Analyzing, 60),
                (UploadStatus::Complete, 100),
            ]
        );
        assert_eq!(service.calls.get(), 1);
        assert!(m.state().error().is_none());
    }

    #[test]
    fn failed_submit_ends_in_error_with_server_message() {
        let mut m = machine();
        let service = FakeService::failing(500, "server down");
        m.select_file(chat_file()).unwrap();

        let mut seen = Vec::new();
        let err = m
            .submit(&service, AnalysisMode::Basic, &mut |s: &UploadState| {
                seen.push(s.clone())
            })
            .unwrap_err();

        assert!(matches!(err, AnalyzerError::Remote { status: 500, .. }));
        let statuses: Vec<_> = seen.iter().map(|s| s.status()).collect();
        assert_eq!(
            statuses,
            vec![
                UploadStatus::Uploading,
                UploadStatus::Analyzing,
                UploadStatus::Error
            ]
        );
        assert_eq!(m.state().error(), Some("server down"));
        // Progress never moves backwards within the attempt.
        let progress: Vec<_> = seen.iter().map(|s| s.progress()).collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn submit_without_file_is_refused() {
        let mut m = machine();
        let service = FakeService::ok("A");
        let err = m
            .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::NoFileStaged));
        assert_eq!(m.state().status(), UploadStatus::Idle);
        assert_eq!(service.calls.get(), 0);
    }

    #[test]
    fn submit_after_validation_error_never_calls_service() {
        let mut m = machine();
        let service = FakeService::ok("A");
        let _ = m.select_file(StagedFile::new("chat.csv", "x"));
        let err = m
            .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::NotIdle));
        assert_eq!(service.calls.get(), 0);
        assert_eq!(m.state().status(), UploadStatus::Error);
    }

    #[test]
    fn resubmit_after_completion_is_gated() {
        let mut m = machine();
        let service = FakeService::ok("A");
        m.select_file(chat_file()).unwrap();
        m.submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .unwrap();

        assert!(!m.can_submit());
        let err = m
            .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::NotIdle));
        assert!(err.is_client_side());
        assert_ne!(err.to_string(), AnalyzerError::Busy.to_string());
        assert_eq!(service.calls.get(), 1);
    }

    #[test]
    fn reset_clears_error_progress_and_file() {
        let mut m = machine();
        let service = FakeService::failing(502, "bad gateway");
        m.select_file(chat_file()).unwrap();
        let _ = m.submit(&service, AnalysisMode::Advanced, &mut NoopObserver);
        assert_eq!(m.state().progress(), 60);

        m.reset();
        assert_eq!(m.state(), &UploadState::idle());
        assert_eq!(m.state().progress(), 0);
        assert!(m.staged().is_none());
    }

    #[test]
    fn selecting_valid_file_recovers_from_error() {
        let mut m = machine();
        let _ = m.select_file(StagedFile::new("chat.csv", "x"));
        m.select_file(chat_file()).unwrap();
        assert_eq!(m.state(), &UploadState::idle());
        assert!(m.can_submit());
    }

    #[test]
    fn pacing_keeps_checkpoints_ordered() {
        let config = UploadConfig {
            uploading_progress: 80,
            analyzing_progress: 20,
            ..Default::default()
        };
        let pacing = Pacing::from_config(&config);
        assert_eq!(pacing.uploading_progress, 80);
        assert_eq!(pacing.analyzing_progress, 80);
    }

    #[test]
    fn state_serializes_without_error_field_when_absent() {
        let json = serde_json::to_string(&UploadState::idle()).unwrap();
        assert_eq!(json, r#"{"status":"idle","progress":0}"#);
    }
}
