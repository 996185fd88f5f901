use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::CompletionRequest;

/// Port for language model providers.
///
/// Implementations must be `Send + Sync` so one client can be shared by
/// several pipeline stages.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider identifier, e.g. "anthropic" or "mistral".
    fn name(&self) -> &str;

    /// Generate a completion and return its text.
    async fn complete(&self, request: CompletionRequest) -> DomainResult<String>;
}
