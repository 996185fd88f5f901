//! In-process LLM client that replays scripted replies.
//!
//! Used by tests and by the `scripted` provider for offline runs, where an
//! empty script makes every call fail and the pipeline falls back to its
//! deterministic outputs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::CompletionRequest;
use crate::domain::ports::LlmClient;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
    /// Reply after sleeping, for exercising stage timeouts.
    Delayed(Duration, String),
}

#[derive(Default)]
struct Script {
    replies: VecDeque<ScriptedReply>,
    received: Vec<CompletionRequest>,
}

pub struct ScriptedLlmClient {
    name: String,
    script: Mutex<Script>,
    /// Reply used once the queue is drained.
    repeat: Option<ScriptedReply>,
}

impl ScriptedLlmClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(Script::default()),
            repeat: None,
        }
    }

    pub fn with_replies(name: impl Into<String>, replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(Script {
                replies: replies.into_iter().collect(),
                received: Vec::new(),
            }),
            repeat: None,
        }
    }

    /// Answer every call with `reply` once the queue is empty.
    pub fn repeating(mut self, reply: ScriptedReply) -> Self {
        self.repeat = Some(reply);
        self
    }

    pub async fn push(&self, reply: ScriptedReply) {
        self.script.lock().await.replies.push_back(reply);
    }

    /// Requests received so far, in call order.
    pub async fn received(&self) -> Vec<CompletionRequest> {
        self.script.lock().await.received.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.script.lock().await.received.len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> DomainResult<String> {
        let reply = {
            let mut script = self.script.lock().await;
            script.received.push(request);
            script.replies.pop_front().or_else(|| self.repeat.clone())
        };

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(message)) => Err(DomainError::llm(&self.name, message)),
            Some(ScriptedReply::Delayed(wait, text)) => {
                tokio::time::sleep(wait).await;
                Ok(text)
            }
            None => Err(DomainError::llm(&self.name, "no scripted response available")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_fails() {
        let client = ScriptedLlmClient::with_replies(
            "scripted",
            [
                ScriptedReply::Text("first".to_string()),
                ScriptedReply::Fail("boom".to_string()),
            ],
        );

        assert_eq!(client.complete(CompletionRequest::new("a")).await.unwrap(), "first");
        assert!(client.complete(CompletionRequest::new("b")).await.is_err());
        assert!(client.complete(CompletionRequest::new("c")).await.is_err());

        let prompts: Vec<String> = client.received().await.into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_repeating_reply() {
        let client = ScriptedLlmClient::new("scripted")
            .repeating(ScriptedReply::Text("again".to_string()));
        for _ in 0..3 {
            assert_eq!(client.complete(CompletionRequest::new("x")).await.unwrap(), "again");
        }
        assert_eq!(client.call_count().await, 3);
    }
}
