//! End-to-end behavior of the judge-and-refine loop over a seeded database.

mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use insight_loop::adapters::llm::{ScriptedLlmClient, ScriptedReply};
use insight_loop::domain::errors::{DomainError, DomainResult};
use insight_loop::domain::models::{
    IterationConfig, LoopPhase, MessageRole, StopReason, StructuredResultSet, SynthesisOutput,
    SynthesisRequest, WorkflowConfig, WorkflowState,
};
use insight_loop::domain::ports::{DataAggregator, NarrativeSynthesizer, QualityJudge};
use insight_loop::services::{build_controller, IterationController, LlmQualityJudge};

use common::{
    judgment, narrative, scripted_judge, scripted_writer, seeded_store, temp_dir, test_config,
};

async fn run_with_judge(judge: Arc<ScriptedLlmClient>) -> WorkflowState {
    let dir = temp_dir();
    let config = test_config(&dir);
    let controller = build_controller(&config, seeded_store().await, scripted_writer(), judge);
    controller.run("Quarterly business review").await.unwrap()
}

fn stop_reason(state: &WorkflowState) -> StopReason {
    state
        .judge_analysis
        .as_ref()
        .and_then(|a| a.iteration_summary.as_ref())
        .map(|s| s.stop_reason)
        .expect("terminal state carries an iteration summary")
}

fn assert_well_formed(state: &WorkflowState, config: &IterationConfig) {
    assert_eq!(state.improvement_history.len() as u32, state.iteration_count);
    assert!(state.iteration_count >= 1);
    assert!(state.iteration_count <= config.max_iterations);
    assert_eq!(state.phase, LoopPhase::Done);
    assert_eq!(state.conversation[0].role, MessageRole::User);
    assert_eq!(state.conversation[1].role, MessageRole::DataRequester);
    assert_eq!(state.conversation[2].role, MessageRole::SqlAgent);
    assert_eq!(
        state.conversation.last().map(|m| m.role),
        Some(MessageRole::System)
    );
}

#[tokio::test]
async fn test_stagnation_stops_after_second_iteration() {
    let state = run_with_judge(scripted_judge(&[0.6, 0.62])).await;

    assert_eq!(state.iteration_count, 2);
    assert_eq!(stop_reason(&state), StopReason::Stagnation);
    assert!((state.final_quality_score - 0.62).abs() < 1e-9);
    assert_eq!(state.score_trajectory(), vec![0.6, 0.62]);
    assert_well_formed(&state, &IterationConfig::default());
}

#[tokio::test]
async fn test_threshold_stops_after_first_iteration() {
    let judge = scripted_judge(&[0.85, 0.9]);
    let state = run_with_judge(Arc::clone(&judge)).await;

    assert_eq!(state.iteration_count, 1);
    assert_eq!(stop_reason(&state), StopReason::QualityThreshold);
    assert_eq!(judge.call_count().await, 1);
    assert_well_formed(&state, &IterationConfig::default());
}

#[tokio::test]
async fn test_iteration_cap_reached() {
    let state = run_with_judge(scripted_judge(&[0.3, 0.5, 0.7, 0.75])).await;

    assert_eq!(state.iteration_count, 3);
    assert_eq!(stop_reason(&state), StopReason::MaxIterations);
    assert!((state.final_quality_score - 0.7).abs() < 1e-9);
    assert_well_formed(&state, &IterationConfig::default());
}

#[tokio::test]
async fn test_judge_failures_degrade_to_default_critique() {
    let judge = Arc::new(
        ScriptedLlmClient::new("judge").repeating(ScriptedReply::Fail("503 upstream".to_string())),
    );
    let state = run_with_judge(judge).await;

    assert_eq!(state.iteration_count, 2);
    assert_eq!(stop_reason(&state), StopReason::Stagnation);
    assert!((state.final_quality_score - 0.5).abs() < 1e-9);

    let analysis = state.judge_analysis.as_ref().unwrap();
    assert!(analysis.critique.anomalies[0].contains("Judge call failed"));
    assert_well_formed(&state, &IterationConfig::default());
}

#[tokio::test]
async fn test_refinement_receives_previous_feedback() {
    let dir = temp_dir();
    let config = test_config(&dir);
    let writer = scripted_writer();
    let controller = build_controller(
        &config,
        seeded_store().await,
        Arc::clone(&writer) as _,
        scripted_judge(&[0.4, 0.9]),
    );

    let state = controller.run("Quarterly business review").await.unwrap();
    assert_eq!(state.iteration_count, 2);
    assert_eq!(stop_reason(&state), StopReason::QualityThreshold);

    let prompts = writer.received().await;
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].prompt.contains("REVIEWER FEEDBACK"));
    assert!(prompts[1].prompt.contains("REVIEWER FEEDBACK ON THE PREVIOUS DRAFT (iteration 1)"));
    assert!(prompts[1].prompt.contains("Quantify the churn impact"));

    let path = state.report_artifact_path.as_ref().unwrap();
    assert!(path.starts_with(&config.reports.output_dir));
    let rendered = std::fs::read_to_string(path).unwrap();
    assert!(rendered.contains("Iteration: 2"));
}

#[tokio::test]
async fn test_slow_judge_degrades_to_default_critique() {
    let dir = temp_dir();
    let mut config = test_config(&dir);
    config.workflow.judge_timeout_secs = 1;
    let judge = Arc::new(ScriptedLlmClient::with_replies(
        "judge",
        [
            ScriptedReply::Delayed(Duration::from_secs(3), judgment(0.95)),
            ScriptedReply::Text(judgment(0.85)),
        ],
    ));
    let controller = build_controller(&config, seeded_store().await, scripted_writer(), judge);

    let state = controller.run("review").await.unwrap();
    assert_eq!(state.iteration_count, 2);
    assert_eq!(state.score_trajectory(), vec![0.5, 0.85]);
    assert_eq!(stop_reason(&state), StopReason::QualityThreshold);
    assert!(state
        .conversation
        .iter()
        .all(|m| m.role != MessageRole::Error));
    assert_well_formed(&state, &config.iteration);
}

#[tokio::test]
async fn test_hanging_judge_scores_every_iteration_at_default() {
    let dir = temp_dir();
    let mut config = test_config(&dir);
    config.workflow.judge_timeout_secs = 1;
    let judge = Arc::new(
        ScriptedLlmClient::new("judge")
            .repeating(ScriptedReply::Delayed(Duration::from_secs(3), judgment(0.95))),
    );
    let controller = build_controller(&config, seeded_store().await, scripted_writer(), judge);

    let state = controller.run("review").await.unwrap();
    assert_eq!(state.iteration_count, 2);
    assert_eq!(state.score_trajectory(), vec![0.5, 0.5]);
    assert_eq!(stop_reason(&state), StopReason::Stagnation);
    let analysis = state.judge_analysis.as_ref().unwrap();
    assert!(analysis.critique.anomalies[0].contains("Judge call failed"));
    assert!(analysis.critique.anomalies[0].contains("timed out"));
    assert_well_formed(&state, &config.iteration);
}

#[tokio::test]
async fn test_slow_writer_produces_fallback_report() {
    let dir = temp_dir();
    let mut config = test_config(&dir);
    config.workflow.synthesis_timeout_secs = 1;
    let writer = Arc::new(
        ScriptedLlmClient::new("writer")
            .repeating(ScriptedReply::Delayed(Duration::from_secs(3), narrative("late"))),
    );
    let controller =
        build_controller(&config, seeded_store().await, writer, scripted_judge(&[0.9]));

    let state = controller.run("review").await.unwrap();
    assert_eq!(state.iteration_count, 1);
    assert_eq!(stop_reason(&state), StopReason::QualityThreshold);
    assert!(!state.report_text.is_empty());
    assert!(!state.report_text.contains("Draft late"));
    let path = state.report_artifact_path.as_ref().unwrap();
    assert!(path.exists());
    assert!(state
        .conversation
        .iter()
        .any(|m| m.role == MessageRole::Synthesizer && m.content.contains("templated fallback")));
}

struct CountingAggregator {
    inner: Arc<dyn DataAggregator>,
    calls: AtomicUsize,
    requests_seen: AtomicUsize,
}

#[async_trait]
impl DataAggregator for CountingAggregator {
    async fn ensure_ready(&self) -> DomainResult<()> {
        self.inner.ensure_ready().await
    }

    async fn aggregate(&self, requests: &[String]) -> StructuredResultSet {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests_seen.store(requests.len(), Ordering::SeqCst);
        self.inner.aggregate(requests).await
    }
}

struct DownAggregator;

#[async_trait]
impl DataAggregator for DownAggregator {
    async fn ensure_ready(&self) -> DomainResult<()> {
        Err(DomainError::DataStoreUnavailable("no database configured".to_string()))
    }

    async fn aggregate(&self, _requests: &[String]) -> StructuredResultSet {
        panic!("aggregate must not run after a failed preflight");
    }
}

struct BrokenSynthesizer;

#[async_trait]
impl NarrativeSynthesizer for BrokenSynthesizer {
    async fn synthesize(&self, _request: SynthesisRequest<'_>) -> DomainResult<SynthesisOutput> {
        Err(DomainError::RenderFailed("disk full".to_string()))
    }
}

/// Delegates to a real synthesizer but fails the second call, recording
/// which judged iteration each request carried.
struct FlakySynthesizer {
    inner: Arc<dyn NarrativeSynthesizer>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(u32, Option<u32>)>>,
}

#[async_trait]
impl NarrativeSynthesizer for FlakySynthesizer {
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> DomainResult<SynthesisOutput> {
        self.seen
            .lock()
            .unwrap()
            .push((request.iteration, request.feedback.as_ref().map(|f| f.iteration)));
        if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
            return Err(DomainError::RenderFailed("disk full".to_string()));
        }
        self.inner.synthesize(request).await
    }
}

fn judge_from(client: Arc<ScriptedLlmClient>) -> Arc<dyn QualityJudge> {
    Arc::new(LlmQualityJudge::new(client))
}

fn writer_pipeline(dir: &tempfile::TempDir) -> Arc<dyn NarrativeSynthesizer> {
    Arc::new(insight_loop::services::LlmNarrativeSynthesizer::new(
        scripted_writer(),
        Arc::new(insight_loop::adapters::reports::TextReportRenderer::new(dir.path())),
    ))
}

#[tokio::test]
async fn test_data_gathered_once_per_run() {
    let dir = temp_dir();
    let store = seeded_store().await;
    let inner = insight_loop::services::SqlDataAggregator::new(
        store,
        Arc::new(insight_loop::services::KeywordRequestRouter::new()),
    );
    let counting = Arc::new(CountingAggregator {
        inner: Arc::new(inner),
        calls: AtomicUsize::new(0),
        requests_seen: AtomicUsize::new(0),
    });

    let controller = IterationController::new(
        Arc::clone(&counting) as _,
        writer_pipeline(&dir),
        judge_from(scripted_judge(&[0.2, 0.4, 0.6])),
        IterationConfig::default(),
        WorkflowConfig::default(),
    );
    let state = controller.run("review").await.unwrap();

    assert_eq!(state.iteration_count, 3);
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert_eq!(counting.requests_seen.load(Ordering::SeqCst), 4);
    assert_eq!(state.source_data.as_ref().unwrap().len(), 4);
}

#[tokio::test]
async fn test_failed_preflight_never_enters_loop() {
    let dir = temp_dir();
    let judge = scripted_judge(&[0.9]);
    let controller = IterationController::new(
        Arc::new(DownAggregator),
        writer_pipeline(&dir),
        judge_from(Arc::clone(&judge)),
        IterationConfig::default(),
        WorkflowConfig::default(),
    );

    let err = controller.run("review").await.unwrap_err();
    assert!(matches!(err, DomainError::DataStoreUnavailable(_)));
    assert_eq!(judge.call_count().await, 0);
}

#[tokio::test]
async fn test_synthesis_failures_still_terminate() {
    let judge = scripted_judge(&[0.9]);
    let controller = IterationController::new(
        Arc::new(CountingAggregator {
            inner: Arc::new(insight_loop::services::SqlDataAggregator::new(
                seeded_store().await,
                Arc::new(insight_loop::services::KeywordRequestRouter::new()),
            )),
            calls: AtomicUsize::new(0),
            requests_seen: AtomicUsize::new(0),
        }),
        Arc::new(BrokenSynthesizer),
        judge_from(Arc::clone(&judge)),
        IterationConfig::default(),
        WorkflowConfig::default(),
    );

    let state = controller.run("review").await.unwrap();
    assert_eq!(state.iteration_count, 2);
    assert_eq!(stop_reason(&state), StopReason::Stagnation);
    assert!(state.report_artifact_path.is_none());
    assert_eq!(judge.call_count().await, 0);
    assert!(state.improvement_history[0].top_issues[0].contains("disk full"));
    assert_well_formed(&state, &IterationConfig::default());
}

#[tokio::test]
async fn test_single_iteration_budget() {
    let dir = temp_dir();
    let mut config = test_config(&dir);
    config.iteration.max_iterations = 1;
    let controller =
        build_controller(&config, seeded_store().await, scripted_writer(), scripted_judge(&[0.1]));

    let state = controller.run("review").await.unwrap();
    assert_eq!(state.iteration_count, 1);
    assert_eq!(stop_reason(&state), StopReason::MaxIterations);
    assert_well_formed(&state, &config.iteration);
}

#[tokio::test]
async fn test_feedback_keeps_its_judged_iteration_after_failed_synthesis() {
    let dir = temp_dir();
    let flaky = Arc::new(FlakySynthesizer {
        inner: writer_pipeline(&dir),
        calls: AtomicUsize::new(0),
        seen: Mutex::new(Vec::new()),
    });
    // A negative delta keeps the flat score after the failed cycle from stopping the run.
    let iteration = IterationConfig {
        stagnation_delta: -1.0,
        ..IterationConfig::default()
    };
    let controller = IterationController::new(
        Arc::new(insight_loop::services::SqlDataAggregator::new(
            seeded_store().await,
            Arc::new(insight_loop::services::KeywordRequestRouter::new()),
        )),
        Arc::clone(&flaky) as _,
        judge_from(scripted_judge(&[0.2, 0.3])),
        iteration.clone(),
        WorkflowConfig::default(),
    );

    let state = controller.run("review").await.unwrap();
    assert_eq!(state.iteration_count, 3);
    assert_eq!(state.score_trajectory(), vec![0.2, 0.2, 0.3]);
    assert_eq!(
        *flaky.seen.lock().unwrap(),
        vec![(1, None), (2, Some(1)), (3, Some(1))]
    );
    assert_eq!(state.feedback_iteration, Some(3));
    assert_well_formed(&state, &iteration);
}
