//! Domain errors for the insight pipeline.

use thiserror::Error;

/// Domain-level errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Data store unavailable: {0}")]
    DataStoreUnavailable(String),

    #[error("Query failed: {message}")]
    QueryFailed { message: String, query: String },

    #[error("LLM call failed ({provider}): {message}")]
    LlmCallFailed { provider: String, message: String },

    #[error("Stage '{stage}' timed out after {seconds}s")]
    StageTimeout { stage: String, seconds: u64 },

    #[error("Report rendering failed: {0}")]
    RenderFailed(String),

    #[error("Ingestion failed for {path}: {reason}")]
    IngestionFailed { path: String, reason: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Create an LLM failure tagged with the provider name.
    pub fn llm(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LlmCallFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error must stop the workflow before the loop starts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DataStoreUnavailable(_) | Self::ValidationFailed(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}
