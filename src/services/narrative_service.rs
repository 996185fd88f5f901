//! Narrative synthesis and refinement.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::adapters::cache::NarrativeCache;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CompletionRequest, LlmConfig, ReportDocument, SynthesisOutput, SynthesisRequest,
};
use crate::domain::ports::{LlmClient, NarrativeSynthesizer, ReportRenderer};
use crate::services::competitive_analysis::assess;
use crate::services::metrics_extractor::extract_metrics;
use crate::services::prompts::{fallback_narrative, synthesis_prompt, SYNTHESIS_SYSTEM};

/// Model output shorter than this is treated as unusable.
pub const MIN_NARRATIVE_CHARS: usize = 40;

pub const REPORT_TITLE: &str = "Business Performance Report";

/// Synthesizer backed by an [`LlmClient`], with a deterministic fallback.
///
/// First passes with identical metrics are served from the cache when one
/// is configured. Refinement passes always call the model.
pub struct LlmNarrativeSynthesizer {
    llm: Arc<dyn LlmClient>,
    renderer: Arc<dyn ReportRenderer>,
    cache: Option<NarrativeCache>,
    max_tokens: u32,
    temperature: Option<f32>,
    call_timeout: Option<Duration>,
}

impl LlmNarrativeSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, renderer: Arc<dyn ReportRenderer>) -> Self {
        Self {
            llm,
            renderer,
            cache: None,
            max_tokens: 2048,
            temperature: None,
            call_timeout: None,
        }
    }

    /// Bound the model call. A call that overruns is treated like a failed one.
    pub fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    async fn complete(&self, completion: CompletionRequest) -> DomainResult<String> {
        let Some(limit) = self.call_timeout else {
            return self.llm.complete(completion).await;
        };
        tokio::time::timeout(limit, self.llm.complete(completion))
            .await
            .unwrap_or_else(|_| {
                Err(DomainError::StageTimeout {
                    stage: "synthesis call".to_string(),
                    seconds: limit.as_secs(),
                })
            })
    }

    pub fn with_cache(mut self, cache: NarrativeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_llm_config(mut self, config: &LlmConfig) -> Self {
        self.max_tokens = config.max_tokens;
        self.temperature = config.temperature;
        self
    }
}

#[async_trait]
impl NarrativeSynthesizer for LlmNarrativeSynthesizer {
    #[instrument(skip(self, request), fields(iteration = request.iteration, refinement = request.is_refinement()))]
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> DomainResult<SynthesisOutput> {
        let metrics = extract_metrics(request.results);
        let forces = assess(&metrics);
        debug!(metrics = metrics.len(), attractiveness = %forces.attractiveness, "metrics resolved");

        let cacheable = !request.is_refinement();
        let cached = match (&self.cache, cacheable) {
            (Some(cache), true) => cache.get(&metrics).await,
            _ => None,
        };

        let (narrative, used_fallback, cache_hit) = if let Some(text) = cached {
            info!("narrative served from cache");
            (text, false, true)
        } else {
            let completion = CompletionRequest::new(synthesis_prompt(
                &metrics,
                &forces,
                request.feedback.as_ref(),
            ))
            .with_system(SYNTHESIS_SYSTEM)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

            match self.complete(completion).await {
                Ok(text) if text.trim().chars().count() >= MIN_NARRATIVE_CHARS => {
                    let text = text.trim().to_string();
                    if let (Some(cache), true) = (&self.cache, cacheable) {
                        cache.insert(&metrics, &text).await;
                    }
                    (text, false, false)
                }
                Ok(text) => {
                    warn!(chars = text.trim().chars().count(), "model narrative too short, using fallback");
                    (fallback_narrative(&metrics, &forces), true, false)
                }
                Err(err) => {
                    warn!(provider = self.llm.name(), error = %err, "narrative generation failed, using fallback");
                    (fallback_narrative(&metrics, &forces), true, false)
                }
            }
        };

        let document = ReportDocument {
            title: REPORT_TITLE.to_string(),
            generated_at: Utc::now(),
            iteration: request.iteration,
            metrics: metrics.clone(),
            forces,
            narrative: narrative.clone(),
        };
        let artifact_path = self.renderer.render(&document).await?;

        Ok(SynthesisOutput {
            artifact_path,
            narrative,
            metrics,
            used_fallback,
            cache_hit,
        })
    }
}
