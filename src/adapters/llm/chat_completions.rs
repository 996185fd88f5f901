//! OpenAI-compatible chat completions client (Mistral, OpenAI).

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CompletionRequest, LlmConfig};
use crate::domain::ports::LlmClient;

use super::error::LlmApiError;
use super::retry::RetryPolicy;

pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `/chat/completions` endpoints with bearer authentication.
pub struct ChatCompletionsClient {
    provider: String,
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig) -> DomainResult<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            LlmApiError::MissingApiKey(config.api_key_env.clone()).into_domain(&config.provider)
        })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> DomainResult<Self> {
        let default_base = if config.provider == "openai" {
            OPENAI_BASE_URL
        } else {
            MISTRAL_BASE_URL
        };
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::ValidationFailed(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            provider: config.provider.clone(),
            http,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(default_base)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, payload: &ChatRequest<'_>) -> Result<String, LlmApiError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmApiError::from_status(status, body));
        }

        let parsed: ChatResponse = serde_json::from_str(&response.text().await?)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmApiError::EmptyResponse)
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.provider
    }

    #[instrument(skip(self, request), fields(provider = %self.provider, model = %self.model))]
    async fn complete(&self, request: CompletionRequest) -> DomainResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let payload = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let payload = &payload;

        self.retry
            .execute(move || self.send_once(payload))
            .await
            .map_err(|e| e.into_domain(&self.provider))
    }
}
