/// End-to-end upload scenarios through the application store.
///
/// A scripted in-process service stands in for the remote analyzer so every
/// state transition and history write can be observed without a network.
use std::cell::{Cell, RefCell};

use chatlens::client::AnalysisService;
use chatlens::config::AnalysisMode;
use chatlens::error::{AnalyzerError, INVALID_EXTENSION_MESSAGE, Result};
use chatlens::events::EventLog;
use chatlens::history::{FileBackend, HISTORY_LIMIT, HistoryCache, MemoryBackend};
use chatlens::model::{AnalysisResult, ValidationReport};
use chatlens::store::AppStore;
use chatlens::upload::{NoopObserver, Pacing, StagedFile, UploadState, UploadStatus};

// ---------------------------------------------------------------------------
// Scripted service
// ---------------------------------------------------------------------------

struct ScriptedService {
    replies: RefCell<Vec<Result<AnalysisResult>>>,
    calls: Cell<usize>,
}

impl ScriptedService {
    fn new(replies: Vec<Result<AnalysisResult>>) -> Self {
        Self {
            replies: RefCell::new(replies),
            calls: Cell::new(0),
        }
    }

    fn always_ok(n: usize) -> Self {
        Self::new((0..n).map(|i| Ok(named(&format!("partner-{i}")))).collect())
    }
}

impl AnalysisService for ScriptedService {
    fn analyze(&self, _file: &StagedFile, _mode: AnalysisMode) -> Result<AnalysisResult> {
        self.calls.set(self.calls.get() + 1);
        let mut replies = self.replies.borrow_mut();
        if replies.is_empty() {
            return Err(AnalyzerError::Network("no scripted reply".to_string()));
        }
        replies.remove(0)
    }

    fn validate(&self, _file: &StagedFile) -> Result<ValidationReport> {
        Ok(ValidationReport::default())
    }
}

fn named(partner: &str) -> AnalysisResult {
    AnalysisResult {
        partner_name: partner.to_string(),
        summary: format!("talks with {partner}"),
        ..Default::default()
    }
}

fn store() -> AppStore {
    AppStore::open(
        Pacing::default().without_delays(),
        Box::new(MemoryBackend::new()),
        EventLog::disabled(),
    )
}

fn chat() -> StagedFile {
    StagedFile::new("chat.txt", "2024. 1. 1. 오후 3:00, 민수 : 안녕")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn chat_txt_completes_and_lands_in_history() {
    let payload = AnalysisResult {
        partner_name: "민수".to_string(),
        my_sentiment_score: 80.0,
        ..Default::default()
    };
    let service = ScriptedService::new(vec![Ok(payload.clone())]);
    let mut store = store();

    let mut seen = Vec::new();
    store.select_file(chat()).unwrap();
    store
        .submit(&service, AnalysisMode::Advanced, &mut |s: &UploadState| {
            seen.push(s.status())
        })
        .unwrap();

    assert_eq!(
        seen,
        vec![
            UploadStatus::Uploading,
            UploadStatus::Analyzing,
            UploadStatus::Complete
        ]
    );
    assert_eq!(store.upload_state().status(), UploadStatus::Complete);
    assert_eq!(store.upload_state().progress(), 100);
    assert_eq!(store.current_analysis(), Some(&payload));
    assert_eq!(store.history()[0].partner_name, "민수");
}

#[test]
fn chat_csv_errors_immediately_without_network_call() {
    let service = ScriptedService::always_ok(1);
    let mut store = store();

    let err = store
        .select_file(StagedFile::new("chat.csv", "a,b,c"))
        .unwrap_err();
    assert!(err.is_client_side());
    assert_eq!(store.upload_state().status(), UploadStatus::Error);
    assert_eq!(store.upload_state().error(), Some(INVALID_EXTENSION_MESSAGE));

    assert!(!store.can_submit());
    assert!(
        store
            .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .is_err()
    );
    assert_eq!(service.calls.get(), 0);
}

#[test]
fn server_error_message_reaches_upload_state() {
    let service = ScriptedService::new(vec![Err(AnalyzerError::Remote {
        status: 500,
        message: "server down".to_string(),
    })]);
    let mut store = store();

    store.select_file(chat()).unwrap();
    let err = store
        .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
        .unwrap_err();

    assert!(matches!(err, AnalyzerError::Remote { status: 500, .. }));
    assert_eq!(store.upload_state().status(), UploadStatus::Error);
    assert_eq!(store.upload_state().error(), Some("server down"));
    assert!(store.current_analysis().is_none());
    assert!(store.history().is_empty());
}

#[test]
fn failure_is_not_retried_and_reset_allows_a_new_attempt() {
    let service = ScriptedService::new(vec![
        Err(AnalyzerError::Network("timed out".to_string())),
        Ok(named("B")),
    ]);
    let mut store = store();

    store.select_file(chat()).unwrap();
    let _ = store.submit(&service, AnalysisMode::Basic, &mut NoopObserver);
    assert_eq!(service.calls.get(), 1);

    // Still in error: a second submit is refused.
    assert!(
        store
            .submit(&service, AnalysisMode::Basic, &mut NoopObserver)
            .is_err()
    );
    assert_eq!(service.calls.get(), 1);

    store.reset_upload();
    assert_eq!(store.upload_state(), &UploadState::idle());
    assert!(store.staged_file().is_none());

    store.select_file(chat()).unwrap();
    store
        .submit(&service, AnalysisMode::Basic, &mut NoopObserver)
        .unwrap();
    assert_eq!(store.history()[0].partner_name, "B");
}

#[test]
fn progress_never_decreases_within_an_attempt() {
    for reply in [
        Ok(named("A")),
        Err(AnalyzerError::Remote {
            status: 503,
            message: String::new(),
        }),
    ] {
        let service = ScriptedService::new(vec![reply]);
        let mut store = store();
        store.select_file(chat()).unwrap();

        let mut progress = vec![store.upload_state().progress()];
        let _ = store.submit(&service, AnalysisMode::Advanced, &mut |s: &UploadState| {
            progress.push(s.progress())
        });
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    }
}

#[test]
fn empty_remote_message_falls_back_to_generic_text() {
    let service = ScriptedService::new(vec![Err(AnalyzerError::Remote {
        status: 500,
        message: String::new(),
    })]);
    let mut store = store();
    store.select_file(chat()).unwrap();
    let _ = store.submit(&service, AnalysisMode::Advanced, &mut NoopObserver);

    assert_eq!(
        store.upload_state().error(),
        Some(chatlens::error::GENERIC_FAILURE_MESSAGE)
    );
}

#[test]
fn eleven_completions_keep_the_ten_newest() {
    let service = ScriptedService::always_ok(11);
    let mut store = store();

    for _ in 0..11 {
        store.select_file(chat()).unwrap();
        store
            .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .unwrap();
        store.reset_upload();
    }

    let history = store.history();
    assert_eq!(history.len(), HISTORY_LIMIT);
    assert_eq!(history[0].partner_name, "partner-10");
    assert!(history.iter().all(|item| item.partner_name != "partner-0"));
}

#[test]
fn clear_history_twice_is_idempotent() {
    let service = ScriptedService::always_ok(2);
    let mut store = store();
    for _ in 0..2 {
        store.select_file(chat()).unwrap();
        store
            .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .unwrap();
        store.reset_upload();
    }

    store.clear_history().unwrap();
    assert!(store.history().is_empty());
    store.clear_history().unwrap();
    assert!(store.history().is_empty());
}

#[test]
fn only_history_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let slot = dir.path().join("chat-analyzer-storage.json");
    let service = ScriptedService::always_ok(1);

    {
        let mut store = AppStore::open(
            Pacing::default().without_delays(),
            Box::new(FileBackend::new(&slot)),
            EventLog::disabled(),
        );
        store.select_file(chat()).unwrap();
        store
            .submit(&service, AnalysisMode::Advanced, &mut NoopObserver)
            .unwrap();
    }

    let restarted = AppStore::open(
        Pacing::default().without_delays(),
        Box::new(FileBackend::new(&slot)),
        EventLog::disabled(),
    );
    assert!(restarted.current_analysis().is_none());
    assert!(restarted.staged_file().is_none());
    assert_eq!(restarted.upload_state(), &UploadState::idle());
    assert_eq!(restarted.history().len(), 1);

    let raw = std::fs::read_to_string(&slot).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["analysis_history"][0]["partner_name"], "partner-0");
    assert!(value.get("current_analysis").is_none());
    assert!(value.get("upload_state").is_none());

    let cache = HistoryCache::open(Box::new(FileBackend::new(&slot))).unwrap();
    assert_eq!(cache.list()[0].result.summary, "talks with partner-0");
}
