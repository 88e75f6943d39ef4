//! Error handling and custom error types
//!
//! `Error` covers startup and infrastructure failures; `RelayError` is the
//! per-request taxonomy that the HTTP layer maps onto status codes.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single `/generate-solution` exchange.
///
/// None of these are retried; each ends the request it occurred in.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Cannot parse JSON body: {0}")]
    MalformedRequest(String),

    #[error("Invalid base64 data: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("Gemini API key is not configured")]
    MissingCredential,

    #[error("Gemini API request failed: {detail}")]
    UpstreamUnreachable { detail: String, timed_out: bool },

    #[error("Gemini API returned non-2xx status {status}")]
    UpstreamError { status: u16 },

    #[error("Failed to decode Gemini API response: {0}")]
    UpstreamMalformedResponse(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) | Self::InvalidEncoding(_) => StatusCode::BAD_REQUEST,
            Self::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamUnreachable { .. }
            | Self::UpstreamError { .. }
            | Self::UpstreamMalformedResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Client-facing headline, without diagnostic detail.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "Cannot parse JSON body",
            Self::InvalidEncoding(_) => "Invalid base64 data",
            Self::MissingCredential => "Gemini API key is not configured",
            Self::UpstreamUnreachable { .. } => "Gemini API request failed",
            Self::UpstreamError { .. } => "Gemini API returned non-2xx status",
            Self::UpstreamMalformedResponse(_) => "Failed to decode Gemini API response",
        }
    }

    /// Diagnostic detail surfaced to the caller. Never includes the API key.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::MalformedRequest(_) | Self::MissingCredential => None,
            Self::InvalidEncoding(e) => Some(e.to_string()),
            Self::UpstreamUnreachable { detail, .. } => Some(detail.clone()),
            Self::UpstreamError { status } => {
                Some(format!("upstream responded with status {}", status))
            }
            Self::UpstreamMalformedResponse(detail) => Some(detail.clone()),
        }
    }

    /// Upstream status code, only for `UpstreamError`.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamError { status } => Some(*status),
            _ => None,
        }
    }
}
