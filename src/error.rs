//! Error taxonomy for the upload/analysis client.
//!
//! Three kinds of failure reach the user:
//!
//! - **Validation**: wrong file type, caught before any network call.
//! - **Transport / remote**: network failure or a non-success HTTP status.
//! - **Local state**: storage problems and refused actions (nothing staged,
//!   an attempt already in flight).
//!
//! Presentation-time problems (missing result fields) never surface here;
//! the renderers fall back to their own defaults.

use thiserror::Error;

/// Message shown when a file without the export suffix is selected.
pub const INVALID_EXTENSION_MESSAGE: &str = "Only chat export files (.txt) can be uploaded.";

/// Fallback message for remote failures that carry no message of their own.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during analysis.";

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("{}", INVALID_EXTENSION_MESSAGE)]
    InvalidExtension { file_name: String },

    #[error("no file is staged for upload")]
    NoFileStaged,

    #[error("an upload is already in progress")]
    Busy,

    /// Submit outside `idle`; the previous attempt has to be reset first.
    #[error("the previous upload has finished; reset before submitting again")]
    NotIdle,

    /// Non-2xx response from the analysis service.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// Connection refused, DNS failure, timeout, ...
    #[error("{0}")]
    Network(String),

    /// 2xx response whose body did not match the expected shape.
    #[error("malformed response from analysis service: {0}")]
    MalformedResponse(String),

    #[error("history storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    /// Text placed into `UploadState::error` when this error ends an attempt.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Whether the failure happened before any request left the client.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::InvalidExtension { .. } | Self::NoFileStaged | Self::Busy | Self::NotIdle
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
