use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{QueryOutcome, TableData, TableSchema};

/// Executes query strings against the data store.
///
/// Statement failures are reported as [`QueryOutcome::Error`]; `Err` is
/// reserved for the store itself being unreachable.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> DomainResult<QueryOutcome>;
}

/// Introspectable table storage.
#[async_trait]
pub trait DataStore: QueryExecutor {
    /// Verify the store is reachable.
    async fn ping(&self) -> DomainResult<()>;

    /// Every user table with its ordered `(column, type)` pairs.
    async fn schema(&self) -> DomainResult<Vec<TableSchema>>;
}

/// Write side used by ingestion only.
#[async_trait]
pub trait TableWriter: Send + Sync {
    /// Replace any existing table of the same name with `table`.
    /// Returns the number of rows written.
    async fn replace_table(&self, table: &TableData) -> DomainResult<u64>;
}
