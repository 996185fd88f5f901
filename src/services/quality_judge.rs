//! Model-backed quality judge.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ComparisonResult, CompletionRequest, IterationRecord, LlmConfig};
use crate::domain::ports::{LlmClient, QualityJudge};
use crate::services::judgment_parser::{parse_judgment, JudgmentParse};
use crate::services::prompts::{judge_prompt, JUDGE_SYSTEM};

const JUDGE_MAX_TOKENS: u32 = 3000;
const JUDGE_TEMPERATURE: f32 = 0.1;

/// Judge that asks an [`LlmClient`] for a JSON critique.
///
/// Call failures, timeouts and malformed responses degrade to a mid-range
/// critique; this implementation never returns `Err`.
pub struct LlmQualityJudge {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: Option<f32>,
    call_timeout: Option<Duration>,
}

impl LlmQualityJudge {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_tokens: JUDGE_MAX_TOKENS,
            temperature: Some(JUDGE_TEMPERATURE),
            call_timeout: None,
        }
    }

    pub fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    pub fn with_llm_config(mut self, config: &LlmConfig) -> Self {
        self.max_tokens = config.max_tokens;
        self.temperature = config.temperature;
        self
    }
}

#[async_trait]
impl QualityJudge for LlmQualityJudge {
    #[instrument(skip(self, narrative, source_data, history), fields(provider = self.llm.name()))]
    async fn judge(
        &self,
        narrative: &str,
        source_data: &str,
        iteration: u32,
        history: &[IterationRecord],
    ) -> DomainResult<ComparisonResult> {
        let request = CompletionRequest::new(judge_prompt(narrative, source_data, iteration, history))
            .with_system(JUDGE_SYSTEM)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let reply = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.llm.complete(request))
                .await
                .unwrap_or_else(|_| {
                    Err(DomainError::StageTimeout {
                        stage: "judge call".to_string(),
                        seconds: limit.as_secs(),
                    })
                }),
            None => self.llm.complete(request).await,
        };

        let raw = match reply {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "judge call failed, using default critique");
                return Ok(ComparisonResult::call_failed(&err.to_string()));
            }
        };

        let parsed = parse_judgment(&raw);
        match &parsed {
            JudgmentParse::Parsed { result, repaired } => {
                if *repaired {
                    warn!("judge response needed repair");
                }
                info!(quality_score = result.quality_score, "judgment parsed");
            }
            JudgmentParse::Degraded { reason, .. } => {
                warn!(%reason, "judge response unparseable, using default critique");
            }
        }
        Ok(parsed.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::{ScriptedLlmClient, ScriptedReply};

    #[tokio::test]
    async fn test_parses_scores_from_model() {
        let llm = Arc::new(ScriptedLlmClient::with_replies(
            "judge",
            [ScriptedReply::Text(r#"{"quality_score": 0.85, "overall_assessment": "good"}"#.to_string())],
        ));
        let judge = LlmQualityJudge::new(llm.clone());

        let result = judge.judge("report", "data", 1, &[]).await.unwrap();
        assert!((result.quality_score - 0.85).abs() < 1e-9);

        let sent = &llm.received().await[0];
        assert_eq!(sent.max_tokens, 3000);
        assert_eq!(sent.temperature, Some(0.1));
        assert!(sent.prompt.contains("REPORT: report"));
    }

    #[tokio::test]
    async fn test_call_failure_degrades() {
        let llm = Arc::new(ScriptedLlmClient::new("judge"));
        let result = LlmQualityJudge::new(llm).judge("r", "d", 1, &[]).await.unwrap();
        assert!((result.quality_score - 0.5).abs() < 1e-9);
        assert!(result.anomalies[0].contains("Judge call failed"));
    }

    #[tokio::test]
    async fn test_garbage_degrades() {
        let llm = Arc::new(ScriptedLlmClient::with_replies(
            "judge",
            [ScriptedReply::Text("not json at all".to_string())],
        ));
        let result = LlmQualityJudge::new(llm).judge("r", "d", 2, &[]).await.unwrap();
        assert!((result.quality_score - 0.5).abs() < 1e-9);
        assert!(result.anomalies[0].starts_with("JSON parsing error"));
    }

    #[tokio::test]
    async fn test_hanging_judge_degrades_to_default_critique() {
        let llm = Arc::new(ScriptedLlmClient::new("judge").repeating(ScriptedReply::Delayed(
            Duration::from_secs(5),
            r#"{"quality_score": 0.95}"#.to_string(),
        )));
        let judge = LlmQualityJudge::new(llm).with_call_timeout(Duration::from_millis(50));

        let result = judge.judge("r", "d", 1, &[]).await.unwrap();
        assert!((result.quality_score - 0.5).abs() < 1e-9);
        assert!(result.anomalies[0].contains("timed out"));
    }
}
