use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ComparisonResult, IterationRecord};

/// Scores a narrative against the data it was written from.
#[async_trait]
pub trait QualityJudge: Send + Sync {
    /// Produce a critique. Model-backed judges degrade instead of failing;
    /// an `Err` is still contained by the iteration controller.
    async fn judge(
        &self,
        narrative: &str,
        source_data: &str,
        iteration: u32,
        history: &[IterationRecord],
    ) -> DomainResult<ComparisonResult>;
}
