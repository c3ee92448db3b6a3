//! Clients for the two external analyzers.

pub mod gemini;
pub mod normalize;
pub mod phdv;

pub use gemini::GeminiClient;
pub use phdv::{PhdvClient, PhdvReply};

use thiserror::Error;

/// Failure kinds at the external-call boundary. Handlers map these to
/// user-facing messages; nothing downstream inspects raw error text.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("API key is missing")]
    MissingApiKey,
    #[error("upstream quota exhausted")]
    QuotaExhausted,
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    #[error("upstream returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_connect() {
            UpstreamError::Unreachable(err.to_string())
        } else if err.is_decode() {
            UpstreamError::InvalidResponse(err.to_string())
        } else {
            UpstreamError::Unreachable(err.to_string())
        }
    }
}
