//! Error types for the analysis service
//!
//! Covers everything that can go wrong between serializing the notebook and
//! holding a decoded payload:
//! - Client misconfiguration
//! - Transport failures (connect, timeout, reading the body)
//! - Non-success HTTP status
//! - Bodies that are not JSON

/// Analysis service error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Client could not be configured
    #[error("invalid service configuration: {0}")]
    Config(String),

    /// Notebook snapshot could not be encoded
    #[error("could not encode notebook snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    /// Request never produced a response
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Target URL
        url: String,
        /// Underlying error
        message: String,
        /// Whether the request timed out
        timed_out: bool,
    },

    /// Server answered with a non-success status
    #[error("analysis service returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Response body is not JSON
    #[error("analysis response is not valid JSON: {0}")]
    MalformedBody(String),
}

impl ServiceError {
    /// Check if retrying the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Config(_) | Self::Encode(_) | Self::MalformedBody(_) => false,
        }
    }

    /// HTTP status, if the server answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short description suitable for a status line
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Config(_) => "service is misconfigured".to_string(),
            Self::Encode(_) => "notebook could not be encoded".to_string(),
            Self::Transport { timed_out: true, .. } => "request timed out".to_string(),
            Self::Transport { .. } => "service unreachable".to_string(),
            Self::Status { status, .. } => format!("server returned {status}"),
            Self::MalformedBody(_) => "response was not JSON".to_string(),
        }
    }
}
