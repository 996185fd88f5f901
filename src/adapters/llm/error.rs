use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors that can occur when calling an LLM provider over HTTP.
#[derive(Error, Debug)]
pub enum LlmApiError {
    /// Invalid request parameters or malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to invalid or missing API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No API key in the configured environment variable
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API server error: {0}")]
    ServerError(String),

    #[error("API server overloaded")]
    Overloaded,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The provider answered but returned no text
    #[error("Empty response from provider")]
    EmptyResponse,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LlmApiError {
    /// Returns true if this error is transient and should be retried.
    ///
    /// Transient errors are rate limits, 5xx responses, overload and
    /// network failures (including client-side timeouts).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmApiError::RateLimitExceeded
                | LlmApiError::ServerError(_)
                | LlmApiError::Overloaded
                | LlmApiError::NetworkError(_)
        )
    }

    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Map an HTTP status and body to an error variant.
    ///
    /// - 400, 404, 422: invalid request
    /// - 401, 403: authentication failed
    /// - 429: rate limit exceeded
    /// - 529: overloaded
    /// - other 5xx: server error
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 | 404 | 422 => LlmApiError::InvalidRequest(body),
            401 | 403 => LlmApiError::AuthenticationFailed(body),
            429 => LlmApiError::RateLimitExceeded,
            529 => LlmApiError::Overloaded,
            500..=599 => LlmApiError::ServerError(format!("HTTP {status}: {body}")),
            _ => LlmApiError::Unknown(format!("HTTP {status}: {body}")),
        }
    }

    pub fn into_domain(self, provider: &str) -> DomainError {
        DomainError::llm(provider, self.to_string())
    }
}
