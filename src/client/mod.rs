/// Client for the external chat-analysis service.
///
/// The service is an opaque collaborator: the client uploads the raw export
/// file as a `multipart/form-data` body (single `file` field) and expects an
/// [`AnalysisResult`]-shaped JSON document back. Only transport-level
/// outcomes are interpreted here:
///
/// - **2xx**: body parsed into the expected type.
/// - **non-2xx**: the `message` field of the JSON error body becomes the
///   user-facing error, else a generic fallback.
/// - **network failure**: the transport's own description.
///
/// Requests are synchronous (`reqwest::blocking`) with the configured
/// timeout. There is no retry.
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::AnalysisMode;
use crate::config::schema::ServerConfig;
use crate::error::{AnalyzerError, GENERIC_FAILURE_MESSAGE, Result};
use crate::model::{AnalysisResult, ValidationReport};
use crate::upload::StagedFile;

/// Form field the service reads the upload from.
const FILE_FIELD: &str = "file";

/// Timeout for the health probe, independent of the analysis timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// The remote operations the upload flow depends on.
pub trait AnalysisService {
    /// Upload `file` to the endpoint selected by `mode`.
    fn analyze(&self, file: &StagedFile, mode: AnalysisMode) -> Result<AnalysisResult>;

    /// Ask the service whether `file` looks like a usable transcript.
    fn validate(&self, file: &StagedFile) -> Result<ValidationReport>;

    /// Probe the service. Implementations without a probe report a
    /// network error.
    fn health(&self) -> Result<ServiceHealth> {
        Err(AnalyzerError::Network(
            "health check not supported".to_string(),
        ))
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceHealth {
    pub status: String,
    /// Whether the service has credentials for its AI backend.
    pub api_configured: bool,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Error body returned by the service on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl HttpAnalysisClient {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;
        // "localhost" may resolve to ::1 first on Windows while the service
        // only binds IPv4.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_file<T: DeserializeOwned>(&self, path: &str, file: &StagedFile) -> Result<T> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(upload_file_name(&file.name))
            .mime_str("text/plain; charset=utf-8")
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;
        // Non-ASCII names go out as raw UTF-8, the way browsers send them.
        let form = Form::new().percent_encode_noop().part(FILE_FIELD, part);

        let response = self
            .http
            .post(self.url(path))
            .timeout(self.timeout)
            .multipart(form)
            .send();
        parse_response(response)
    }
}

impl AnalysisService for HttpAnalysisClient {
    fn analyze(&self, file: &StagedFile, mode: AnalysisMode) -> Result<AnalysisResult> {
        self.post_file(mode.endpoint(), file)
    }

    fn validate(&self, file: &StagedFile) -> Result<ValidationReport> {
        self.post_file("/api/validate", file)
    }

    fn health(&self) -> Result<ServiceHealth> {
        let response = self
            .http
            .get(self.url("/health"))
            .timeout(HEALTH_TIMEOUT)
            .send();
        parse_response(response)
    }
}

/// Quotes and line breaks cannot appear inside the quoted `filename`
/// parameter.
fn upload_file_name(name: &str) -> String {
    name.replace(['"', '\r', '\n'], "_")
}

/// Map a `reqwest` outcome onto the client's error taxonomy.
fn parse_response<T: DeserializeOwned>(
    response: std::result::Result<Response, reqwest::Error>,
) -> Result<T> {
    let resp = response.map_err(|e| AnalyzerError::Network(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(AnalyzerError::Remote {
            status: status.as_u16(),
            message: remote_message(&body),
        });
    }

    let text = resp
        .text()
        .map_err(|e| AnalyzerError::MalformedResponse(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| AnalyzerError::MalformedResponse(e.to_string()))
}

/// The `message` field of an error body, or the generic fallback.
fn remote_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let client = HttpAnalysisClient::from_config(&ServerConfig::default()).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:8000");
        assert_eq!(client.timeout, Duration::from_millis(120_000));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client =
            HttpAnalysisClient::new("http://analyzer:9000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/api/validate"), "http://analyzer:9000/api/validate");
    }

    #[test]
    fn remote_message_prefers_message_field() {
        assert_eq!(
            remote_message(r#"{"error":"UNKNOWN_ERROR","message":"server down"}"#),
            "server down"
        );
    }

    #[test]
    fn remote_message_falls_back_to_generic() {
        assert_eq!(remote_message(""), GENERIC_FAILURE_MESSAGE);
        assert_eq!(remote_message("<html>502</html>"), GENERIC_FAILURE_MESSAGE);
        assert_eq!(remote_message(r#"{"error":"X"}"#), GENERIC_FAILURE_MESSAGE);
        assert_eq!(remote_message(r#"{"message":"  "}"#), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn upload_file_name_replaces_header_breaking_chars() {
        assert_eq!(upload_file_name("카톡_민수.txt"), "카톡_민수.txt");
        assert_eq!(upload_file_name("a\"b.txt"), "a_b.txt");
        assert_eq!(upload_file_name("a\r\nb.txt"), "a__b.txt");
    }

    #[test]
    fn health_status() {
        let health: ServiceHealth =
            serde_json::from_str(r#"{"status":"healthy","api_configured":false}"#).unwrap();
        assert!(health.is_healthy());
        assert!(!health.api_configured);
    }
}
