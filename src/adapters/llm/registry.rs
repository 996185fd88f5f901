//! Builds LLM clients from provider configuration.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::LlmConfig;
use crate::domain::ports::LlmClient;

use super::anthropic::AnthropicClient;
use super::chat_completions::ChatCompletionsClient;
use super::scripted::ScriptedLlmClient;

/// Providers accepted in the `provider` field.
pub const KNOWN_PROVIDERS: [&str; 4] = ["anthropic", "mistral", "openai", "scripted"];

/// Create the client described by `config`.
pub fn build_client(config: &LlmConfig) -> DomainResult<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::new(config)?)),
        "mistral" | "openai" => Ok(Arc::new(ChatCompletionsClient::new(config)?)),
        "scripted" => Ok(Arc::new(ScriptedLlmClient::new("scripted"))),
        other => Err(DomainError::ValidationFailed(format!(
            "unknown LLM provider '{other}' (expected one of: {})",
            KNOWN_PROVIDERS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            model: "m".to_string(),
            base_url: None,
            api_key_env: "INSIGHT_REGISTRY_TEST_KEY".to_string(),
            timeout_secs: 5,
            max_retries: 0,
            max_tokens: 100,
            temperature: None,
        }
    }

    #[test]
    fn test_scripted_needs_no_key() {
        let client = build_client(&config("scripted")).unwrap();
        assert_eq!(client.name(), "scripted");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = build_client(&config("llama")).err().unwrap();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[test]
    fn test_http_provider_with_key() {
        temp_env::with_var("INSIGHT_REGISTRY_TEST_KEY", Some("k"), || {
            assert_eq!(build_client(&config("mistral")).unwrap().name(), "mistral");
            assert_eq!(build_client(&config("anthropic")).unwrap().name(), "anthropic");
        });
    }
}
