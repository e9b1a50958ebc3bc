//! Error types for LLM calls.

use thiserror::Error;

/// Broad class of an LLM failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Bad or missing API key
    Auth,
    /// Provider asked us to slow down
    RateLimited,
    /// Request rejected as invalid
    BadRequest,
    /// Provider-side failure (5xx)
    Server,
    /// Connection, DNS or timeout failure
    Transport,
    /// Response body could not be decoded
    Decode,
    Other,
}

/// A failed LLM request.
#[derive(Debug, Clone, Error)]
#[error("{kind:?} error{}: {message}", status_suffix(.status))]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: classify_http_status(status),
            status: Some(status),
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        401 | 403 => LlmErrorKind::Auth,
        429 => LlmErrorKind::RateLimited,
        400 | 404 | 413 | 422 => LlmErrorKind::BadRequest,
        408 => LlmErrorKind::Transport,
        500..=599 => LlmErrorKind::Server,
        _ => LlmErrorKind::Other,
    }
}
