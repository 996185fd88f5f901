//! Judge critique types.

use serde::{Deserialize, Serialize};

use super::workflow_state::StopReason;

/// Structured critique returned by one quality judgment.
///
/// Every field is always populated; degraded judgments carry mid-range
/// scores and an anomaly explaining what went wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub anomalies: Vec<String>,
    pub similarities: Vec<String>,
    pub confidence_score: f64,
    pub authenticity_score: f64,
    pub data_integration_score: f64,
    pub quality_score: f64,
    pub detailed_analysis: String,
    pub overall_assessment: String,
    pub improvement_suggestions: Vec<String>,
    pub personalization_evidence: Vec<String>,
    pub generic_indicators: Vec<String>,
    pub key_inconsistencies: Vec<String>,
}

/// Score used for every dimension of a degraded critique.
pub const DEGRADED_SCORE: f64 = 0.5;

impl ComparisonResult {
    /// Canonical critique used when the judge response cannot be parsed.
    pub fn unparseable(reason: &str) -> Self {
        Self {
            anomalies: vec![format!("JSON parsing error: {reason}")],
            similarities: Vec::new(),
            confidence_score: DEGRADED_SCORE,
            authenticity_score: DEGRADED_SCORE,
            data_integration_score: DEGRADED_SCORE,
            quality_score: DEGRADED_SCORE,
            detailed_analysis: "Response could not be properly parsed".to_string(),
            overall_assessment: "Analysis completed with format issues".to_string(),
            improvement_suggestions: vec![
                "JSON parsing failed - please review response format".to_string(),
            ],
            personalization_evidence: Vec::new(),
            generic_indicators: vec!["Response format issues".to_string()],
            key_inconsistencies: Vec::new(),
        }
    }

    /// Critique used when the judge could not be reached at all.
    pub fn call_failed(reason: &str) -> Self {
        Self {
            anomalies: vec![format!("Judge call failed: {reason}")],
            similarities: Vec::new(),
            confidence_score: DEGRADED_SCORE,
            authenticity_score: DEGRADED_SCORE,
            data_integration_score: DEGRADED_SCORE,
            quality_score: DEGRADED_SCORE,
            detailed_analysis: format!("Failed to analyze report: {reason}"),
            overall_assessment: "Judgment unavailable; default critique applied".to_string(),
            improvement_suggestions: Vec::new(),
            personalization_evidence: Vec::new(),
            generic_indicators: Vec::new(),
            key_inconsistencies: Vec::new(),
        }
    }

    /// Most pressing issues: inconsistencies first, then anomalies.
    pub fn top_issues(&self, limit: usize) -> Vec<String> {
        self.key_inconsistencies
            .iter()
            .chain(self.anomalies.iter())
            .take(limit)
            .cloned()
            .collect()
    }

    /// Feedback text handed to the next refinement pass.
    pub fn feedback_text(&self) -> String {
        let mut out = format!(
            "Quality score: {:.2}\nAssessment: {}\n",
            self.quality_score, self.overall_assessment
        );
        if !self.improvement_suggestions.is_empty() {
            out.push_str("Improvements requested:\n");
            for s in &self.improvement_suggestions {
                out.push_str(&format!("- {s}\n"));
            }
        }
        if !self.key_inconsistencies.is_empty() {
            out.push_str("Inconsistencies to resolve:\n");
            for s in &self.key_inconsistencies {
                out.push_str(&format!("- {s}\n"));
            }
        }
        if !self.generic_indicators.is_empty() {
            out.push_str("Generic passages to make specific:\n");
            for s in &self.generic_indicators {
                out.push_str(&format!("- {s}\n"));
            }
        }
        if !self.detailed_analysis.is_empty() {
            out.push_str(&format!("Analysis: {}\n", self.detailed_analysis));
        }
        out
    }
}

/// Summary attached to the judge analysis once the loop finalizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub total_iterations: u32,
    pub final_quality_score: f64,
    pub score_trajectory: Vec<f64>,
    pub improvement_notes: Vec<String>,
    pub stop_reason: StopReason,
}

/// Latest critique, plus the iteration summary in the terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeAnalysis {
    #[serde(flatten)]
    pub critique: ComparisonResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_summary: Option<IterationSummary>,
}

impl JudgeAnalysis {
    pub fn new(critique: ComparisonResult) -> Self {
        Self {
            critique,
            iteration_summary: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparseable_defaults() {
        let result = ComparisonResult::unparseable("EOF while parsing");
        assert!((result.quality_score - 0.5).abs() < f64::EPSILON);
        assert!(result.anomalies[0].starts_with("JSON parsing error"));
        assert_eq!(result.generic_indicators, vec!["Response format issues"]);
    }

    #[test]
    fn test_top_issues_prefers_inconsistencies() {
        let mut result = ComparisonResult::call_failed("timeout");
        result.key_inconsistencies = vec!["growth figure contradicts data".to_string()];
        let issues = result.top_issues(2);
        assert_eq!(issues[0], "growth figure contradicts data");
        assert!(issues[1].contains("timeout"));
    }

    #[test]
    fn test_feedback_text_lists_suggestions() {
        let mut result = ComparisonResult::unparseable("bad");
        result.quality_score = 0.62;
        let text = result.feedback_text();
        assert!(text.starts_with("Quality score: 0.62"));
        assert!(text.contains("- JSON parsing failed"));
    }

    #[test]
    fn test_judge_analysis_flattens_critique() {
        let analysis = JudgeAnalysis::new(ComparisonResult::call_failed("x"));
        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value.get("quality_score").is_some());
        assert!(value.get("iteration_summary").is_none());
    }
}
