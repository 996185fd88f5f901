//! Inputs and outputs of narrative synthesis and report rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::competitive_forces::CompetitiveForces;
use super::metrics::MetricsMap;
use super::result_set::StructuredResultSet;

/// Judge feedback carried into a refinement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorFeedback {
    pub text: String,
    pub iteration: u32,
}

/// One synthesis call. `feedback` is `None` on the first pass.
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub results: &'a StructuredResultSet,
    pub feedback: Option<PriorFeedback>,
    /// 1-based number of the iteration this draft belongs to.
    pub iteration: u32,
}

impl<'a> SynthesisRequest<'a> {
    pub fn first_pass(results: &'a StructuredResultSet) -> Self {
        Self {
            results,
            feedback: None,
            iteration: 1,
        }
    }

    /// Redraft of `iteration` guided by an earlier judgment.
    pub fn refinement(
        results: &'a StructuredResultSet,
        feedback: PriorFeedback,
        iteration: u32,
    ) -> Self {
        Self {
            results,
            feedback: Some(feedback),
            iteration,
        }
    }

    pub fn is_refinement(&self) -> bool {
        self.feedback.is_some()
    }
}

/// Result of one synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutput {
    pub artifact_path: PathBuf,
    pub narrative: String,
    pub metrics: MetricsMap,
    /// True when the templated narrative replaced the model output.
    pub used_fallback: bool,
    pub cache_hit: bool,
}

/// Everything the renderer needs to produce a report artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub iteration: u32,
    pub metrics: MetricsMap,
    pub forces: CompetitiveForces,
    pub narrative: String,
}
