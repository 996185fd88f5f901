//! Fans natural-language requests out to canonical queries.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{QueryOutcome, RequestOutcome, StructuredResultSet};
use crate::domain::ports::{DataAggregator, DataStore, RequestRouter};

/// Upper bound on in-flight queries when running in parallel.
const MAX_PARALLEL_QUERIES: usize = 8;

/// Aggregator that runs each request's canonical query against a [`DataStore`].
pub struct SqlDataAggregator {
    store: Arc<dyn DataStore>,
    router: Arc<dyn RequestRouter>,
    query_timeout: Duration,
    parallel: bool,
}

impl SqlDataAggregator {
    pub fn new(store: Arc<dyn DataStore>, router: Arc<dyn RequestRouter>) -> Self {
        Self {
            store,
            router,
            query_timeout: Duration::from_secs(30),
            parallel: false,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Run requests concurrently. Output order still follows input order.
    pub fn with_parallel_queries(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    async fn run_one(&self, request: &str) -> RequestOutcome {
        let template = self.router.classify(request);
        let sql = template.canonical_query();
        debug!(%template, "executing canonical query");

        match tokio::time::timeout(self.query_timeout, self.store.execute(sql)).await {
            Ok(Ok(QueryOutcome::Rows { rows })) => match rows.into_iter().next() {
                Some(row) => RequestOutcome::success(request, template, row),
                None => RequestOutcome::no_data(request, template),
            },
            Ok(Ok(QueryOutcome::Affected { .. })) => RequestOutcome::no_data(request, template),
            Ok(Ok(QueryOutcome::Error { error, query })) => {
                warn!(%template, %error, "query failed");
                RequestOutcome::error(request, template, error, query)
            }
            Ok(Err(err)) => {
                warn!(%template, error = %err, "data store call failed");
                RequestOutcome::error(request, template, err.to_string(), sql)
            }
            Err(_) => {
                let err = DomainError::StageTimeout {
                    stage: format!("query:{template}"),
                    seconds: self.query_timeout.as_secs(),
                };
                warn!(%template, "query timed out");
                RequestOutcome::error(request, template, err.to_string(), sql)
            }
        }
    }
}

#[async_trait]
impl DataAggregator for SqlDataAggregator {
    async fn ensure_ready(&self) -> DomainResult<()> {
        self.store.ping().await.map_err(|err| match err {
            DomainError::DataStoreUnavailable(_) => err,
            other => DomainError::DataStoreUnavailable(other.to_string()),
        })?;

        match self.store.schema().await {
            Ok(tables) if tables.is_empty() => {
                warn!("data store has no tables; every request will report an error");
            }
            Ok(tables) => debug!(tables = tables.len(), "data store ready"),
            Err(err) => warn!(error = %err, "schema introspection failed"),
        }
        Ok(())
    }

    #[instrument(skip(self, requests), fields(requests = requests.len(), parallel = self.parallel))]
    async fn aggregate(&self, requests: &[String]) -> StructuredResultSet {
        let results = if self.parallel {
            let pending: Vec<_> = requests.iter().map(|request| self.run_one(request)).collect();
            stream::iter(pending)
                .buffered(MAX_PARALLEL_QUERIES)
                .collect::<Vec<_>>()
                .await
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.run_one(request).await);
            }
            results
        };

        let set = StructuredResultSet::new(results);
        info!(summary = %set.summary, "data aggregation complete");
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{RequestStatus, Row, TableSchema, TemplateId};
    use crate::services::request_router::KeywordRequestRouter;
    use serde_json::json;

    /// Store that answers by template table name and can be made to fail or stall.
    struct FakeStore {
        fail_on: Option<&'static str>,
        empty_on: Option<&'static str>,
        stall_on: Option<&'static str>,
        reachable: bool,
    }

    impl FakeStore {
        fn healthy() -> Self {
            Self {
                fail_on: None,
                empty_on: None,
                stall_on: None,
                reachable: true,
            }
        }
    }

    #[async_trait]
    impl crate::domain::ports::QueryExecutor for FakeStore {
        async fn execute(&self, sql: &str) -> DomainResult<QueryOutcome> {
            if self.fail_on.is_some_and(|t| sql.contains(t)) {
                return Ok(QueryOutcome::error("no such table", sql));
            }
            if self.stall_on.is_some_and(|t| sql.contains(t)) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            if self.empty_on.is_some_and(|t| sql.contains(t)) {
                return Ok(QueryOutcome::Rows { rows: Vec::new() });
            }
            let mut row = Row::new();
            row.insert("sql_len".to_string(), json!(sql.len()));
            Ok(QueryOutcome::Rows { rows: vec![row] })
        }
    }

    #[async_trait]
    impl DataStore for FakeStore {
        async fn ping(&self) -> DomainResult<()> {
            if self.reachable {
                Ok(())
            } else {
                Err(DomainError::DatabaseError("connection refused".to_string()))
            }
        }

        async fn schema(&self) -> DomainResult<Vec<TableSchema>> {
            Ok(Vec::new())
        }
    }

    fn aggregator(store: FakeStore) -> SqlDataAggregator {
        SqlDataAggregator::new(Arc::new(store), Arc::new(KeywordRequestRouter::new()))
    }

    fn requests(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_no_data_and_error_statuses() {
        let store = FakeStore {
            fail_on: Some("marketing_spend_performance"),
            empty_on: Some("customer_segments"),
            ..FakeStore::healthy()
        };
        let set = aggregator(store)
            .aggregate(&requests(&["sales", "marketing roi", "customer churn"]))
            .await;

        let statuses: Vec<RequestStatus> = set.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            [RequestStatus::Success, RequestStatus::Error, RequestStatus::NoData]
        );
        assert_eq!(set.results[1].error.as_deref(), Some("no such table"));
        assert!(set.results[1].sql.as_deref().unwrap().contains("marketing_spend_performance"));
        assert_eq!(set.summary, "Processed 3 requests, 1 successful");
    }

    #[tokio::test]
    async fn test_parallel_preserves_order() {
        let store = FakeStore::healthy();
        let reqs = requests(&["financial kpi", "sales", "product rating", "customer", "marketing"]);
        let set = aggregator(store)
            .with_parallel_queries(true)
            .aggregate(&reqs)
            .await;

        let templates: Vec<TemplateId> = set.results.iter().map(|r| r.template).collect();
        assert_eq!(
            templates,
            [
                TemplateId::FinancialOverview,
                TemplateId::SalesPerformance,
                TemplateId::ProductPerformance,
                TemplateId::CustomerInsights,
                TemplateId::MarketingEfficiency,
            ]
        );
        let echoed: Vec<&str> = set.results.iter().map(|r| r.request.as_str()).collect();
        assert_eq!(echoed, reqs.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_query_timeout_becomes_error_outcome() {
        let store = FakeStore {
            stall_on: Some("commercial_performance"),
            ..FakeStore::healthy()
        };
        let set = aggregator(store)
            .with_query_timeout(Duration::from_millis(20))
            .aggregate(&requests(&["sales", "customer"]))
            .await;

        assert_eq!(set.results[0].status, RequestStatus::Error);
        assert!(set.results[0].error.as_deref().unwrap().contains("timed out"));
        assert_eq!(set.results[1].status, RequestStatus::Success);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_fatal() {
        let store = FakeStore {
            reachable: false,
            ..FakeStore::healthy()
        };
        let err = aggregator(store).ensure_ready().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_empty_schema_is_only_a_warning() {
        assert!(aggregator(FakeStore::healthy()).ensure_ready().await.is_ok());
    }
}
