pub mod competitive_forces;
pub mod completion;
pub mod config;
pub mod judgment;
pub mod metrics;
pub mod query;
pub mod result_set;
pub mod synthesis;
pub mod template;
pub mod workflow_state;

pub use competitive_forces::{Attractiveness, CompetitiveForces, ForceAssessment, ForceLevel};
pub use completion::CompletionRequest;
pub use config::{
    Config, DatabaseConfig, IterationConfig, LlmConfig, LoggingConfig, ReportConfig,
    WorkflowConfig,
};
pub use judgment::{ComparisonResult, IterationSummary, JudgeAnalysis, DEGRADED_SCORE};
pub use metrics::{MetricValue, MetricsMap, MISSING_TEXT, SATISFACTION_SCALE};
pub use query::{ColumnAffinity, ColumnInfo, QueryOutcome, Row, TableData, TableSchema};
pub use result_set::{RequestOutcome, RequestStatus, StructuredResultSet};
pub use synthesis::{PriorFeedback, ReportDocument, SynthesisOutput, SynthesisRequest};
pub use template::TemplateId;
pub use workflow_state::{
    ConversationMessage, Decision, IterationRecord, LoopPhase, MessageRole, StopReason,
    WorkflowState,
};
