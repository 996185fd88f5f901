//! The bounded synthesize, judge and refine loop.
//!
//! Data is gathered once per run. Each cycle regenerates the narrative,
//! judges it against the fixed data and then decides whether to continue.
//! Stage failures and timeouts are recorded in the state and never abort
//! the loop; only a failed preflight stops a run before it starts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ComparisonResult, Decision, IterationConfig, IterationRecord, IterationSummary, JudgeAnalysis,
    LoopPhase, MessageRole, PriorFeedback, StopReason, StructuredResultSet, SynthesisRequest,
    WorkflowConfig,
    WorkflowState,
};
use crate::domain::ports::{split_requests, DataAggregator, NarrativeSynthesizer, QualityJudge};

/// Tolerance applied to the stagnation comparison.
const SCORE_EPSILON: f64 = 1e-9;

/// Issues and notes kept per history record.
const RECORD_ITEMS: usize = 3;

/// Headroom of the stage backstop over the model call timeout, which the
/// synthesizer and judge enforce themselves.
const STAGE_GRACE: Duration = Duration::from_secs(30);

fn stage_limit(call_timeout_secs: u64) -> Duration {
    Duration::from_secs(call_timeout_secs) + STAGE_GRACE
}

/// Decide whether to run another cycle. Rules are checked in order:
/// iteration cap, quality threshold, mandatory first refinement, stagnation.
///
/// A score regression counts as stagnation.
pub fn decide(state: &WorkflowState, config: &IterationConfig) -> Decision {
    if state.iteration_count >= config.max_iterations {
        return Decision::Finalize(StopReason::MaxIterations);
    }
    if state.final_quality_score >= config.quality_threshold {
        return Decision::Finalize(StopReason::QualityThreshold);
    }
    if state.iteration_count == 1 {
        return Decision::Continue;
    }
    if let [.., previous, latest] = state.improvement_history.as_slice() {
        if latest.quality_score - previous.quality_score <= config.stagnation_delta + SCORE_EPSILON {
            return Decision::Finalize(StopReason::Stagnation);
        }
    }
    Decision::Continue
}

async fn with_timeout<T>(
    stage: &str,
    limit: Duration,
    fut: impl Future<Output = DomainResult<T>>,
) -> DomainResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or_else(|_| {
            Err(DomainError::StageTimeout {
                stage: stage.to_string(),
                seconds: limit.as_secs(),
            })
        })
}

/// Orchestrates one workflow run over injected stage implementations.
pub struct IterationController {
    aggregator: Arc<dyn DataAggregator>,
    synthesizer: Arc<dyn NarrativeSynthesizer>,
    judge: Arc<dyn QualityJudge>,
    iteration: IterationConfig,
    workflow: WorkflowConfig,
}

impl IterationController {
    pub fn new(
        aggregator: Arc<dyn DataAggregator>,
        synthesizer: Arc<dyn NarrativeSynthesizer>,
        judge: Arc<dyn QualityJudge>,
        iteration: IterationConfig,
        workflow: WorkflowConfig,
    ) -> Self {
        Self {
            aggregator,
            synthesizer,
            judge,
            iteration,
            workflow,
        }
    }

    pub fn iteration_config(&self) -> &IterationConfig {
        &self.iteration
    }

    /// Run the workflow for `user_request` and return the terminal state.
    ///
    /// Returns `Err` only when the preflight check fails.
    #[instrument(skip(self, user_request), fields(max_iterations = self.iteration.max_iterations))]
    pub async fn run(&self, user_request: &str) -> DomainResult<WorkflowState> {
        let mut state = WorkflowState::new();
        info!(run_id = %state.run_id, "workflow started");
        state.push_message(MessageRole::User, user_request);

        if let Err(err) = self.aggregator.ensure_ready().await {
            error!(error = %err, "preflight failed, workflow not started");
            return Err(err);
        }

        let delimiter = &self.workflow.request_delimiter;
        let combined = self.workflow.data_requests.join(delimiter);
        state.push_message(MessageRole::DataRequester, combined.as_str());

        let requests = split_requests(&combined, delimiter);
        let data = self.aggregator.aggregate(&requests).await;
        let source_text = data.to_source_text();
        state.push_message(MessageRole::SqlAgent, source_text.as_str());
        state.source_data = Some(data.clone());
        state.advance(LoopPhase::Synthesizing);

        loop {
            self.run_cycle(&mut state, &data, &source_text).await;

            state.advance(LoopPhase::Deciding);
            match decide(&state, &self.iteration) {
                Decision::Continue => {
                    info!(
                        iteration = state.iteration_count,
                        score = state.final_quality_score,
                        "refining report"
                    );
                    state.advance(LoopPhase::Synthesizing);
                }
                Decision::Finalize(reason) => {
                    self.finalize(&mut state, reason);
                    break;
                }
            }
        }
        Ok(state)
    }

    /// One synthesize-then-judge cycle. Always increments the iteration count
    /// and appends exactly one history record.
    async fn run_cycle(
        &self,
        state: &mut WorkflowState,
        data: &StructuredResultSet,
        source_text: &str,
    ) {
        let next = state.iteration_count + 1;
        let request = match (state.feedback.clone(), state.feedback_iteration) {
            (Some(text), Some(judged)) => SynthesisRequest::refinement(
                data,
                PriorFeedback {
                    text,
                    iteration: judged,
                },
                next,
            ),
            _ => SynthesisRequest {
                results: data,
                feedback: None,
                iteration: next,
            },
        };

        let synthesis = with_timeout(
            "synthesis",
            stage_limit(self.workflow.synthesis_timeout_secs),
            self.synthesizer.synthesize(request),
        )
        .await;

        state.iteration_count += 1;
        let iteration = state.iteration_count;

        let output = match synthesis {
            Ok(output) => output,
            Err(err) => {
                self.record_failure(state, "synthesis", &err);
                return;
            }
        };

        state.push_message(
            MessageRole::Synthesizer,
            format!(
                "Iteration {iteration}: report written to {} ({} chars{})",
                output.artifact_path.display(),
                output.narrative.chars().count(),
                if output.used_fallback { ", templated fallback" } else { "" }
            ),
        );
        state.report_artifact_path = Some(output.artifact_path);
        state.report_text = output.narrative;
        state.advance(LoopPhase::Judging);

        let judged = with_timeout(
            "judging",
            stage_limit(self.workflow.judge_timeout_secs),
            self.judge.judge(
                &state.report_text,
                source_text,
                iteration,
                &state.improvement_history,
            ),
        )
        .await;

        match judged {
            Ok(critique) => Self::record_judgment(state, critique),
            Err(err) => self.record_failure(state, "judging", &err),
        }
    }

    fn record_judgment(state: &mut WorkflowState, critique: ComparisonResult) {
        let iteration = state.iteration_count;
        let mut improvements_noted = Vec::new();
        if let Some(previous) = state.improvement_history.last() {
            improvements_noted.push(format!(
                "quality {:+.2} vs iteration {}",
                critique.quality_score - previous.quality_score,
                previous.iteration
            ));
        }
        improvements_noted.extend(
            critique
                .personalization_evidence
                .iter()
                .take(RECORD_ITEMS)
                .cloned(),
        );

        state.improvement_history.push(IterationRecord {
            iteration,
            quality_score: critique.quality_score,
            top_issues: critique.top_issues(RECORD_ITEMS),
            improvements_noted,
        });
        state.push_message(
            MessageRole::Judge,
            format!(
                "Iteration {iteration}: quality score {:.2}. {}",
                critique.quality_score, critique.overall_assessment
            ),
        );
        state.final_quality_score = critique.quality_score;
        state.feedback = Some(critique.feedback_text());
        state.feedback_iteration = Some(iteration);
        state.judge_analysis = Some(JudgeAnalysis::new(critique));

        info!(iteration, score = state.final_quality_score, "iteration judged");
    }

    /// Record a failed stage. The score and feedback stay as they were.
    fn record_failure(&self, state: &mut WorkflowState, stage: &str, err: &DomainError) {
        let iteration = state.iteration_count;
        warn!(iteration, stage, error = %err, "stage failed, continuing with previous state");
        state.push_message(
            MessageRole::Error,
            format!("Iteration {iteration}: {stage} failed: {err}"),
        );
        state.improvement_history.push(IterationRecord {
            iteration,
            quality_score: state.final_quality_score,
            top_issues: vec![format!("{stage} failed: {err}")],
            improvements_noted: Vec::new(),
        });
    }

    fn finalize(&self, state: &mut WorkflowState, reason: StopReason) {
        state.advance(LoopPhase::Finalizing);

        let summary = IterationSummary {
            total_iterations: state.iteration_count,
            final_quality_score: state.final_quality_score,
            score_trajectory: state.score_trajectory(),
            improvement_notes: state
                .improvement_history
                .iter()
                .flat_map(|r| r.improvements_noted.iter().cloned())
                .collect(),
            stop_reason: reason,
        };

        let analysis = state.judge_analysis.get_or_insert_with(|| {
            let mut critique = ComparisonResult::call_failed("no judgment completed");
            critique.quality_score = state.final_quality_score;
            JudgeAnalysis::new(critique)
        });
        analysis.iteration_summary = Some(summary);

        state.push_message(
            MessageRole::System,
            format!(
                "Workflow complete after {} iteration(s): {reason}. Final quality score {:.2}.",
                state.iteration_count, state.final_quality_score
            ),
        );
        state.advance(LoopPhase::Done);
        info!(
            iterations = state.iteration_count,
            score = state.final_quality_score,
            %reason,
            "workflow finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_scores(scores: &[f64]) -> WorkflowState {
        let mut state = WorkflowState::new();
        for (i, score) in scores.iter().enumerate() {
            state.improvement_history.push(IterationRecord {
                iteration: i as u32 + 1,
                quality_score: *score,
                top_issues: vec![],
                improvements_noted: vec![],
            });
        }
        state.iteration_count = scores.len() as u32;
        state.final_quality_score = scores.last().copied().unwrap_or(0.0);
        state
    }

    #[test]
    fn test_first_cycle_always_continues_below_threshold() {
        let config = IterationConfig::default();
        assert_eq!(decide(&state_with_scores(&[0.6]), &config), Decision::Continue);
        assert_eq!(decide(&state_with_scores(&[0.1]), &config), Decision::Continue);
    }

    #[test]
    fn test_threshold_stops_first_cycle() {
        let config = IterationConfig::default();
        assert_eq!(
            decide(&state_with_scores(&[0.85]), &config),
            Decision::Finalize(StopReason::QualityThreshold)
        );
        assert_eq!(
            decide(&state_with_scores(&[0.8]), &config),
            Decision::Finalize(StopReason::QualityThreshold)
        );
    }

    #[test]
    fn test_stagnation_and_regression() {
        let config = IterationConfig::default();
        assert_eq!(
            decide(&state_with_scores(&[0.6, 0.62]), &config),
            Decision::Finalize(StopReason::Stagnation)
        );
        assert_eq!(
            decide(&state_with_scores(&[0.6, 0.65]), &config),
            Decision::Finalize(StopReason::Stagnation)
        );
        assert_eq!(
            decide(&state_with_scores(&[0.6, 0.4]), &config),
            Decision::Finalize(StopReason::Stagnation)
        );
        assert_eq!(decide(&state_with_scores(&[0.5, 0.6]), &config), Decision::Continue);
    }

    #[test]
    fn test_cap_wins_over_everything() {
        let config = IterationConfig::default();
        assert_eq!(
            decide(&state_with_scores(&[0.3, 0.5, 0.9]), &config),
            Decision::Finalize(StopReason::MaxIterations)
        );
        let single = IterationConfig {
            max_iterations: 1,
            ..IterationConfig::default()
        };
        assert_eq!(
            decide(&state_with_scores(&[0.2]), &single),
            Decision::Finalize(StopReason::MaxIterations)
        );
    }

    #[tokio::test]
    async fn test_with_timeout_maps_elapsed_to_stage_timeout() {
        let result: DomainResult<()> = with_timeout("judging", Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(DomainError::StageTimeout { ref stage, .. }) if stage == "judging"));
    }
}
