//! Embedded web dashboard for chatlens.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard: upload form, progress, result cards, history
//! - JSON API endpoints backed by the same [`AppStore`] the CLI uses
//!
//! Launched via `chatlens web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Read;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

pub use api::ApiResponse;

use crate::client::{AnalysisService, HttpAnalysisClient};
use crate::config::ChatlensConfig;
use crate::store::AppStore;

/// Upper bound on an uploaded export; larger bodies are refused.
const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Everything a request handler can touch. Requests are handled one at a
/// time, so the store needs no locking.
pub struct Dashboard<S: AnalysisService> {
    store: AppStore,
    service: S,
    config: ChatlensConfig,
}

impl<S: AnalysisService> Dashboard<S> {
    pub fn new(store: AppStore, service: S, config: ChatlensConfig) -> Self {
        Self {
            store,
            service,
            config,
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    /// Route one request. Handler failures become a JSON 500.
    pub fn handle(&mut self, method: &Method, url: &str, body: &[u8]) -> ApiResponse {
        match self.dispatch(method, url, body) {
            Ok(resp) => resp,
            Err(e) => ApiResponse::error(500, &format!("{e:#}")),
        }
    }

    fn dispatch(&mut self, method: &Method, url: &str, body: &[u8]) -> Result<ApiResponse> {
        // Strip query string for path matching
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            (&Method::Get, "/") | (&Method::Get, "/index.html") => {
                Ok(ApiResponse::html(frontend::INDEX_HTML))
            }

            (&Method::Post, "/api/analyze") => api::post_analyze(
                &mut self.store,
                &self.service,
                self.config.server.mode,
                url,
                body,
            ),
            (&Method::Post, "/api/validate") => api::post_validate(&self.service, url, body),

            (&Method::Get, "/api/current") => api::get_current(&self.store),
            (&Method::Get, "/api/history") => api::get_history(&self.store),
            (&Method::Delete, "/api/history") => api::delete_history(&mut self.store),
            (&Method::Get, p) if p.starts_with("/api/history/") => {
                api::get_history_item(&mut self.store, history_id(p))
            }
            (&Method::Delete, p) if p.starts_with("/api/history/") => {
                api::delete_history_item(&mut self.store, history_id(p))
            }

            (&Method::Get, "/api/config") => api::get_config(&self.config),
            (&Method::Get, "/api/health") => {
                api::get_health(&self.store, &self.service, &self.config)
            }

            _ => Ok(ApiResponse::error(404, "not found")),
        }
    }
}

fn history_id(path: &str) -> &str {
    path.trim_start_matches("/api/history/").trim_end_matches('/')
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on `addr`.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard), which also keeps one upload in flight at
/// a time.
pub fn serve(config: ChatlensConfig, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let service =
        HttpAnalysisClient::from_config(&config.server).context("failed to create HTTP client")?;
    let store = AppStore::from_config(&config);
    let open = config.web.open_browser;
    let mut dashboard = Dashboard::new(store, service, config);

    println!("chatlens dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Post | Method::Put) {
            read_body(request.as_reader(), MAX_UPLOAD_BYTES)
        } else {
            Ok(Vec::new())
        };

        let resp = match body {
            Ok(body) => dashboard.handle(&method, &url, &body),
            Err(refused) => refused,
        };
        let status = resp.status;
        let _ = request.respond(into_response(resp));

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

/// Read a request body of at most `limit` bytes.
///
/// A longer body is refused with 413 and a failed read with 400, so a
/// partial export never reaches the analysis service.
fn read_body<R: Read>(reader: R, limit: u64) -> std::result::Result<Vec<u8>, ApiResponse> {
    let mut body = Vec::new();
    if let Err(e) = reader.take(limit + 1).read_to_end(&mut body) {
        return Err(ApiResponse::error(
            400,
            &format!("failed to read request body: {e}"),
        ));
    }
    if body.len() as u64 > limit {
        return Err(ApiResponse::error(
            413,
            &format!("upload exceeds the {} MB limit", limit / (1024 * 1024)),
        ));
    }
    Ok(body)
}

fn into_response(resp: ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut out = Response::from_data(resp.body).with_status_code(StatusCode(resp.status));
    if let Ok(header) = Header::from_bytes("Content-Type", resp.content_type) {
        out = out.with_header(header);
    }
    out
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
