use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::StructuredResultSet;

/// Gathers business data for a batch of natural-language requests.
#[async_trait]
pub trait DataAggregator: Send + Sync {
    /// Preflight run once before the loop. An `Err` here is fatal.
    async fn ensure_ready(&self) -> DomainResult<()>;

    /// Run every request and return one outcome per request, in input order.
    /// Per-request failures are recorded in the result set, never raised.
    async fn aggregate(&self, requests: &[String]) -> StructuredResultSet;
}

/// Split a combined instruction into trimmed, non-empty requests.
pub fn split_requests(combined: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        let whole = combined.trim();
        return if whole.is_empty() {
            Vec::new()
        } else {
            vec![whole.to_string()]
        };
    }
    combined
        .split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
