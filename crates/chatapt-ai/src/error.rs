//! Error types for chatapt-ai

use thiserror::Error;

/// Result type alias using chatapt-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the generation endpoint
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure: connection refused, DNS, timeout, body read
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Endpoint answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Endpoint answered with a success status but no body
    #[error("Response body is empty")]
    EmptyResponse,

    /// Body decoded, but carried no candidate text
    #[error("Response contained no candidate text")]
    EmptyCompletion,

    /// Invalid or missing API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for Error {
    /// Request URLs are dropped so nothing sensitive in them reaches
    /// error messages or logs.
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.without_url())
    }
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure happened before the endpoint produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// Whether this error came from a timed-out request
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_carries_status_text() {
        let e = Error::api(503, "Service Unavailable");
        assert_eq!(e.to_string(), "API error (503): Service Unavailable");
    }

    #[test]
    fn test_empty_response_display() {
        assert_eq!(Error::EmptyResponse.to_string(), "Response body is empty");
    }

    #[test]
    fn test_is_transport_only_for_http() {
        assert!(!Error::api(500, "Internal Server Error").is_transport());
        assert!(!Error::EmptyResponse.is_transport());
        assert!(!Error::InvalidApiKey.is_timeout());
    }
}
