//! Wires the pipeline stages from configuration.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::adapters::cache::NarrativeCache;
use crate::adapters::llm::build_client;
use crate::adapters::reports::TextReportRenderer;
use crate::adapters::sqlite::{connect, SqliteDataStore};
use crate::domain::errors::DomainResult;
use crate::domain::models::Config;
use crate::domain::ports::{DataStore, LlmClient};
use crate::services::data_aggregator::SqlDataAggregator;
use crate::services::ingestion_service::IngestionService;
use crate::services::iteration_controller::IterationController;
use crate::services::narrative_service::LlmNarrativeSynthesizer;
use crate::services::quality_judge::LlmQualityJudge;
use crate::services::request_router::KeywordRequestRouter;

/// Open the configured SQLite store.
pub async fn open_store(config: &Config) -> DomainResult<Arc<SqliteDataStore>> {
    let pool = connect(&config.database).await?;
    Ok(Arc::new(SqliteDataStore::new(pool)))
}

/// Ingestion service writing into `store`.
pub fn build_ingestion(store: Arc<SqliteDataStore>) -> IngestionService {
    IngestionService::new(store)
}

/// Assemble a controller from an already-open store and explicit model clients.
pub fn build_controller(
    config: &Config,
    store: Arc<dyn DataStore>,
    synthesis_llm: Arc<dyn LlmClient>,
    judge_llm: Arc<dyn LlmClient>,
) -> IterationController {
    let aggregator = SqlDataAggregator::new(store, Arc::new(KeywordRequestRouter::new()))
        .with_query_timeout(Duration::from_secs(config.database.query_timeout_secs))
        .with_parallel_queries(config.workflow.parallel_queries);

    let renderer = TextReportRenderer::new(Path::new(&config.reports.output_dir));
    let synthesizer = LlmNarrativeSynthesizer::new(synthesis_llm, Arc::new(renderer))
        .with_cache(NarrativeCache::from_config(&config.reports))
        .with_llm_config(&config.synthesis)
        .with_call_timeout(Duration::from_secs(config.workflow.synthesis_timeout_secs));

    let judge = LlmQualityJudge::new(judge_llm)
        .with_llm_config(&config.judge)
        .with_call_timeout(Duration::from_secs(config.workflow.judge_timeout_secs));

    IterationController::new(
        Arc::new(aggregator),
        Arc::new(synthesizer),
        Arc::new(judge),
        config.iteration.clone(),
        config.workflow.clone(),
    )
}

/// Build the full workflow from configuration.
pub async fn build_workflow(config: &Config) -> DomainResult<IterationController> {
    let store = open_store(config).await?;
    let synthesis_llm = build_client(&config.synthesis)?;
    let judge_llm = build_client(&config.judge)?;
    info!(
        database = %config.database.path,
        synthesis = synthesis_llm.name(),
        judge = judge_llm.name(),
        "workflow assembled"
    );
    Ok(build_controller(config, store, synthesis_llm, judge_llm))
}
