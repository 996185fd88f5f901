//! Pipeline stages and the iteration loop that drives them.

pub mod competitive_analysis;
pub mod data_aggregator;
pub mod ingestion_service;
pub mod iteration_controller;
pub mod judgment_parser;
pub mod metrics_extractor;
pub mod narrative_service;
pub mod prompts;
pub mod quality_judge;
pub mod request_router;
pub mod workflow_factory;

pub use data_aggregator::SqlDataAggregator;
pub use ingestion_service::{IngestionFailure, IngestionReport, IngestionService, LoadedTable};
pub use iteration_controller::{decide, IterationController};
pub use judgment_parser::{parse_judgment, JudgmentParse};
pub use metrics_extractor::extract_metrics;
pub use narrative_service::LlmNarrativeSynthesizer;
pub use quality_judge::LlmQualityJudge;
pub use request_router::KeywordRequestRouter;
pub use workflow_factory::{build_controller, build_ingestion, build_workflow, open_store};
