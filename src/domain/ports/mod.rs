//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces the pipeline stages depend on:
//! - DataStore / QueryExecutor / TableWriter: relational storage of business tables
//! - LlmClient: text completion against a language model provider
//! - RequestRouter: natural-language request classification
//! - DataAggregator: batch data gathering into a structured result set
//! - NarrativeSynthesizer: metrics to narrative plus rendered artifact
//! - QualityJudge: scored critique of a narrative against its source data
//! - ReportRenderer: durable report artifacts
//!
//! The iteration controller only sees these traits, so every stage can be
//! replaced by a scripted implementation in tests.

pub mod data_aggregator;
pub mod data_store;
pub mod llm_client;
pub mod narrative;
pub mod quality_judge;
pub mod report_renderer;
pub mod request_router;

pub use data_aggregator::{split_requests, DataAggregator};
pub use data_store::{DataStore, QueryExecutor, TableWriter};
pub use llm_client::LlmClient;
pub use narrative::NarrativeSynthesizer;
pub use quality_judge::QualityJudge;
pub use report_renderer::ReportRenderer;
pub use request_router::RequestRouter;
