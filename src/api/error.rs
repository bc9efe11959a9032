//! Error types for the assessment API client.

use thiserror::Error;

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur when talking to the assessment API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to the assessment API at {url}")]
    Connect { url: String },

    #[error("Failed to send request: {0}")]
    Request(String),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error, preferring the API's `detail` field as message.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| body.trim().to_string());

        ApiError::Status { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Status { status: 403, .. })
    }
}
