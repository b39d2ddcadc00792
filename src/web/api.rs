//! JSON API handlers for the web dashboard.
//!
//! Handlers return an [`ApiResponse`]; the server loop turns it into a
//! `tiny_http` response.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::client::AnalysisService;
use crate::config::{self, AnalysisMode, ChatlensConfig};
use crate::error::AnalyzerError;
use crate::history::AnalysisHistoryItem;
use crate::store::AppStore;
use crate::upload::{NoopObserver, Pacing, StagedFile};

// ---------------------------------------------------------------------------
// Response type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status: u16, data: &T) -> Result<Self> {
        let body = serde_json::to_vec(data).context("failed to serialize JSON response")?;
        Ok(Self {
            status,
            content_type: "application/json; charset=utf-8",
            body,
        })
    }

    pub fn html(html: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: html.as_bytes().to_vec(),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            body: body.into_bytes(),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// History list entry; the full result is fetched per item.
#[derive(Serialize)]
struct HistoryEntryResponse<'a> {
    id: &'a str,
    date: &'a str,
    partner_name: &'a str,
    summary: &'a str,
    advanced: bool,
}

impl<'a> From<&'a AnalysisHistoryItem> for HistoryEntryResponse<'a> {
    fn from(item: &'a AnalysisHistoryItem) -> Self {
        Self {
            id: &item.id,
            date: &item.date,
            partner_name: &item.partner_name,
            summary: &item.summary,
            advanced: item.result.is_advanced(),
        }
    }
}

#[derive(Serialize)]
struct ConfigResponse<'a> {
    config: &'a ChatlensConfig,
    toml_text: String,
    /// Checkpoints as the upload machine applies them, after clamping.
    pacing: PacingResponse,
}

#[derive(Serialize)]
struct PacingResponse {
    accepted_extension: String,
    uploading_progress: u8,
    analyzing_progress: u8,
}

#[derive(Serialize)]
struct HealthResponse {
    service_url: String,
    service_status: Option<String>,
    api_configured: Option<bool>,
    service_error: Option<String>,
    history_items: usize,
    history_location: String,
    event_log: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract and percent-decode a query parameter.
pub(crate) fn query_param(url: &str, key: &str) -> Option<String> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key {
            Some(percent_decode(v))
        } else {
            None
        }
    })
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => match (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 2;
                }
                _ => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn error_status(err: &AnalyzerError) -> u16 {
    match err {
        e if e.is_client_side() => 400,
        AnalyzerError::Storage(_) | AnalyzerError::Io(_) | AnalyzerError::Json(_) => 500,
        _ => 502,
    }
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `POST /api/analyze?name=<file>&mode=basic|advanced`: raw file body.
///
/// Runs one attempt through the store's upload machine, then resets the
/// upload so the next request starts from idle.
pub fn post_analyze<S: AnalysisService + ?Sized>(
    store: &mut AppStore,
    service: &S,
    default_mode: AnalysisMode,
    url: &str,
    body: &[u8],
) -> Result<ApiResponse> {
    let Some(name) = query_param(url, "name").filter(|n| !n.is_empty()) else {
        return Ok(ApiResponse::error(400, "missing `name` query parameter"));
    };
    let mode = query_param(url, "mode")
        .and_then(|m| config::parse_mode(&m))
        .unwrap_or(default_mode);

    if let Err(err) = store.select_file(StagedFile::new(name, body)) {
        let resp = serde_json::json!({
            "error": err.user_message(),
            "state": store.upload_state(),
        });
        store.reset_upload();
        return ApiResponse::json(error_status(&err), &resp);
    }

    let outcome = store.submit(service, mode, &mut NoopObserver);
    let state = store.upload_state().clone();
    store.reset_upload();

    match outcome {
        Ok(result) => {
            let history_id = store.history().first().map(|item| item.id.clone());
            ApiResponse::json(
                200,
                &serde_json::json!({
                    "state": state,
                    "mode": mode,
                    "history_id": history_id,
                    "result": result,
                }),
            )
        }
        Err(err) => ApiResponse::json(
            error_status(&err),
            &serde_json::json!({
                "error": err.user_message(),
                "state": state,
            }),
        ),
    }
}

/// `POST /api/validate?name=<file>`: raw file body.
pub fn post_validate<S: AnalysisService + ?Sized>(
    service: &S,
    url: &str,
    body: &[u8],
) -> Result<ApiResponse> {
    let name = query_param(url, "name").unwrap_or_else(|| "upload.txt".to_string());
    match service.validate(&StagedFile::new(name, body)) {
        Ok(report) => ApiResponse::json(200, &report),
        Err(err) => Ok(ApiResponse::error(error_status(&err), &err.user_message())),
    }
}

/// `GET /api/current`: the current analysis, or `null`.
pub fn get_current(store: &AppStore) -> Result<ApiResponse> {
    ApiResponse::json(200, &store.current_analysis())
}

/// `GET /api/history`: most-recent-first list.
pub fn get_history(store: &AppStore) -> Result<ApiResponse> {
    let entries: Vec<HistoryEntryResponse<'_>> =
        store.history().iter().map(HistoryEntryResponse::from).collect();
    ApiResponse::json(200, &entries)
}

/// `GET /api/history/{id}`: opens a saved analysis as the current one.
pub fn get_history_item(store: &mut AppStore, id: &str) -> Result<ApiResponse> {
    let Some(item) = store.history_item(id).cloned() else {
        return Ok(ApiResponse::error(404, "no saved analysis with that id"));
    };
    store.open_history_item(id);
    ApiResponse::json(200, &item)
}

/// `DELETE /api/history/{id}`: unknown ids are not an error.
pub fn delete_history_item(store: &mut AppStore, id: &str) -> Result<ApiResponse> {
    let removed = store
        .remove_from_history(id)
        .context("failed to update history")?;
    ApiResponse::json(200, &serde_json::json!({ "removed": removed }))
}

/// `DELETE /api/history`: clear everything.
pub fn delete_history(store: &mut AppStore) -> Result<ApiResponse> {
    let cleared = store.history().len();
    store.clear_history().context("failed to clear history")?;
    ApiResponse::json(200, &serde_json::json!({ "cleared": cleared }))
}

/// `GET /api/config`: effective configuration.
pub fn get_config(cfg: &ChatlensConfig) -> Result<ApiResponse> {
    let toml_text = toml::to_string_pretty(cfg).unwrap_or_default();
    let pacing = Pacing::from_config(&cfg.upload);
    ApiResponse::json(
        200,
        &ConfigResponse {
            config: cfg,
            toml_text,
            pacing: PacingResponse {
                accepted_extension: pacing.accepted_extension,
                uploading_progress: pacing.uploading_progress,
                analyzing_progress: pacing.analyzing_progress,
            },
        },
    )
}

/// `GET /api/health`: service probe plus local storage summary.
pub fn get_health<S: AnalysisService + ?Sized>(
    store: &AppStore,
    service: &S,
    cfg: &ChatlensConfig,
) -> Result<ApiResponse> {
    let (service_status, api_configured, service_error) = match service.health() {
        Ok(health) => (Some(health.status), Some(health.api_configured), None),
        Err(err) => (None, None, Some(err.user_message())),
    };

    let resp = HealthResponse {
        service_url: cfg.server.base_url.clone(),
        service_status,
        api_configured,
        service_error,
        history_items: store.history().len(),
        history_location: store.history_location(),
        event_log: store.events().path().map(|p| p.display().to_string()),
    };
    ApiResponse::json(200, &resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
