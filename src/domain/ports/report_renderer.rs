use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::errors::DomainResult;
use crate::domain::models::ReportDocument;

/// Writes a report document to durable storage.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Render `document` and return the artifact path. Every call produces
    /// a new, uniquely named artifact.
    async fn render(&self, document: &ReportDocument) -> DomainResult<PathBuf>;
}
