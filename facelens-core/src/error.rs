//! Error types for facelens-core

use thiserror::Error;

/// Main error type for the facelens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Image source refused access to the selected photo
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Upload failed or the upload service reported an explicit error
    #[error("upload error: {0}")]
    Upload(String),

    /// Analysis endpoint returned non-2xx or an unparseable body
    #[error("analysis error ({}): {body}", display_status(.status))]
    Analysis { status: Option<u16>, body: String },

    /// Analytics summary could not be fetched
    #[error("analytics error: {0}")]
    Analytics(String),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no status".to_string(),
    }
}

/// Result type alias for facelens-core
pub type Result<T> = std::result::Result<T, Error>;
