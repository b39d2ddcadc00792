//! Application store: one read API over two lifetimes of state.
//!
//! - [`SessionState`] holds the upload machine and the current analysis. It
//!   lives as long as the process and is never written to disk.
//! - [`HistoryCache`] is the only durable state.
//!
//! Every mutation goes through [`AppStore`], which also records finished
//! upload attempts in the event log.

use std::path::PathBuf;
use std::time::Instant;

use crate::client::AnalysisService;
use crate::config::{self, AnalysisMode, ChatlensConfig};
use crate::error::Result;
use crate::events::{AttemptRecord, EventLog};
use crate::history::{AnalysisHistoryItem, FileBackend, HistoryBackend, HistoryCache};
use crate::model::AnalysisResult;
use crate::upload::{self, Pacing, StagedFile, UploadMachine, UploadObserver, UploadState};

/// Session-scoped state, discarded on restart.
#[derive(Debug, Default)]
pub struct SessionState {
    pub upload: UploadMachine,
    pub current_analysis: Option<AnalysisResult>,
}

#[derive(Debug)]
pub struct AppStore {
    session: SessionState,
    history: HistoryCache,
    events: EventLog,
}

impl AppStore {
    /// Build the store from resolved configuration.
    ///
    /// An unreadable history slot does not block startup: the store starts
    /// with an empty history (overwritten on the next write) and a warning is
    /// added to the event log.
    pub fn from_config(config: &ChatlensConfig) -> Self {
        let events = EventLog::from_config(&config.logging);
        let slot = config::expand_home(&config.history.path)
            .unwrap_or_else(|| PathBuf::from(&config.history.path));
        Self::open(
            Pacing::from_config(&config.upload),
            Box::new(FileBackend::new(slot)),
            events,
        )
    }

    pub fn open(pacing: Pacing, backend: Box<dyn HistoryBackend>, events: EventLog) -> Self {
        let (history, load_error) = HistoryCache::open_or_empty(backend);
        if let Some(err) = load_error {
            events.log_warning(&format!(
                "starting with empty history ({}): {err}",
                history.location()
            ));
        }
        Self::with_history(pacing, history, events)
    }

    pub fn with_history(pacing: Pacing, history: HistoryCache, events: EventLog) -> Self {
        Self {
            session: SessionState {
                upload: UploadMachine::new(pacing),
                current_analysis: None,
            },
            history,
            events,
        }
    }

    // -- reads --------------------------------------------------------------

    pub fn current_analysis(&self) -> Option<&AnalysisResult> {
        self.session.current_analysis.as_ref()
    }

    pub fn upload_state(&self) -> &UploadState {
        self.session.upload.state()
    }

    pub fn staged_file(&self) -> Option<&StagedFile> {
        self.session.upload.staged()
    }

    pub fn can_submit(&self) -> bool {
        self.session.upload.can_submit()
    }

    /// Most-recent-first.
    pub fn history(&self) -> &[AnalysisHistoryItem] {
        self.history.list()
    }

    pub fn history_item(&self, id: &str) -> Option<&AnalysisHistoryItem> {
        self.history.get(id)
    }

    pub fn history_location(&self) -> String {
        self.history.location()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // -- upload -------------------------------------------------------------

    pub fn select_file(&mut self, file: StagedFile) -> Result<()> {
        self.session.upload.select_file(file)
    }

    /// Run one upload attempt for the staged file.
    ///
    /// On success the result becomes the current analysis and is prepended
    /// to history. If the history write fails the result stays current and
    /// the storage error is returned. Refused submits (nothing staged, not
    /// idle) leave no trace in the event log.
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
        if !self.can_submit() {
            return self.session.upload.submit(service, mode, observer);
        }
        let file_name = self
            .staged_file()
            .map(|f| f.name.clone())
            .unwrap_or_default();

        let started = Instant::now();
        let outcome = self.session.upload.submit(service, mode, observer);
        let latency_ms = started.elapsed().as_millis() as u64;

        let state = self.session.upload.state();
        self.events.log_attempt(&AttemptRecord {
            file_name: &file_name,
            mode,
            status: &state.status().to_string(),
            progress: state.progress(),
            error: state.error(),
            latency_ms,
        });

        let result = outcome?;
        self.session.current_analysis = Some(result.clone());
        if let Err(err) = self.history.add(result.clone()) {
            self.events
                .log_warning(&format!("failed to persist history: {err}"));
            return Err(err);
        }
        // Published and saved; hold `complete` on screen before handing off.
        upload::pause(self.session.upload.pacing().completion_delay);
        Ok(result)
    }

    /// Clear the staged file and upload status. The current analysis stays.
    pub fn reset_upload(&mut self) {
        self.session.upload.reset();
    }

    /// Start over: reset the upload and drop the current analysis.
    pub fn reset(&mut self) {
        self.session.upload.reset();
        self.session.current_analysis = None;
    }

    // -- history ------------------------------------------------------------

    /// Make a past result the current analysis. Returns `None` for an
    /// unknown id and leaves the current analysis untouched.
    pub fn open_history_item(&mut self, id: &str) -> Option<&AnalysisResult> {
        let result = self.history.get(id)?.result.clone();
        self.session.current_analysis = Some(result);
        self.session.current_analysis.as_ref()
    }

    pub fn remove_from_history(&mut self, id: &str) -> Result<bool> {
        self.history.remove(id)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
