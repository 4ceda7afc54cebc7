//! Error types for the Dashboard API client.

use thiserror::Error;

/// Errors that can occur during Dashboard API operations.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A request argument failed validation before any network activity.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-2xx response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or empty credentials).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The base URL override could not be parsed.
    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}
