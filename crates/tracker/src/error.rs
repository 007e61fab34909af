//! Error types for tracker API calls.

use thiserror::Error;

/// Errors that can occur when talking to the tracker API.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exhausted
    #[error("Rate limit exceeded, reset in {reset_in_secs}s")]
    RateLimited { reset_in_secs: u64 },

    /// Token rejected
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Response body did not match the expected shape
    #[error("Invalid response from GitHub: {0}")]
    InvalidResponse(String),
}
