//! Structured result set produced by the data aggregation stage.

use serde::{Deserialize, Serialize};

use super::query::Row;
use super::template::TemplateId;

/// Per-request outcome tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Success,
    NoData,
    Error,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoData => "no_data",
            Self::Error => "error",
        }
    }
}

/// Outcome of one natural-language data request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub request: String,
    pub template: TemplateId,
    pub status: RequestStatus,
    /// First returned row on success, empty on `no_data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The attempted query, kept on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl RequestOutcome {
    pub fn success(request: impl Into<String>, template: TemplateId, row: Row) -> Self {
        Self {
            request: request.into(),
            template,
            status: RequestStatus::Success,
            data: Some(row),
            error: None,
            sql: None,
        }
    }

    pub fn no_data(request: impl Into<String>, template: TemplateId) -> Self {
        Self {
            request: request.into(),
            template,
            status: RequestStatus::NoData,
            data: Some(Row::new()),
            error: None,
            sql: None,
        }
    }

    pub fn error(
        request: impl Into<String>,
        template: TemplateId,
        error: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        Self {
            request: request.into(),
            template,
            status: RequestStatus::Error,
            data: None,
            error: Some(error.into()),
            sql: Some(sql.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RequestStatus::Success
    }
}

/// All outcomes of one aggregation, in request order, plus a count summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResultSet {
    #[serde(rename = "type")]
    pub kind: String,
    pub results: Vec<RequestOutcome>,
    pub summary: String,
}

impl StructuredResultSet {
    pub fn new(results: Vec<RequestOutcome>) -> Self {
        let summary = format!(
            "Processed {} requests, {} successful",
            results.len(),
            results.iter().filter(|r| r.is_success()).count()
        );
        Self {
            kind: "structured_data".to_string(),
            results,
            summary,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Pretty JSON text used as the source-data view for judging.
    pub fn to_source_text(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.summary.clone())
    }
}
