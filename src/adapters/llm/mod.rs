//! Language model provider adapters.

pub mod anthropic;
pub mod chat_completions;
pub mod error;
pub mod registry;
pub mod retry;
pub mod scripted;

pub use anthropic::AnthropicClient;
pub use chat_completions::ChatCompletionsClient;
pub use error::LlmApiError;
pub use registry::{build_client, KNOWN_PROVIDERS};
pub use retry::RetryPolicy;
pub use scripted::{ScriptedLlmClient, ScriptedReply};
