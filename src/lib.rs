//! Insight Loop - data-grounded business reports with a judge-and-refine loop
//!
//! Business tables live in SQLite. A fixed set of natural-language data
//! requests is routed to canonical queries, the results are turned into a
//! strategic narrative by one model and scored by another, and the narrative
//! is refined until the score is good enough, stops improving, or the
//! iteration budget runs out.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models and the port traits stages depend on
//! - **Adapter Layer** (`adapters`): SQLite, LLM providers, report rendering, caching
//! - **Service Layer** (`services`): pipeline stages and the iteration controller
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use insight_loop::{build_workflow, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let state = build_workflow(&config).await?.run("Quarterly review").await?;
//!     println!("{:?}", state.report_artifact_path);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    ComparisonResult, Config, IterationConfig, IterationRecord, StopReason, StructuredResultSet,
    TemplateId, WorkflowState,
};
pub use domain::ports::{DataAggregator, NarrativeSynthesizer, QualityJudge, RequestRouter};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{build_workflow, IterationController};
