//! Prompt construction for synthesis and judging, plus the templated fallback narrative.

use std::fmt::Write as _;

use crate::domain::models::{
    CompetitiveForces, IterationRecord, MetricsMap, PriorFeedback, SATISFACTION_SCALE,
};

/// Report characters sent to the judge.
pub const JUDGE_REPORT_CHARS: usize = 1500;

/// Source-data characters sent to the judge.
pub const JUDGE_DATA_CHARS: usize = 1000;

pub const SYNTHESIS_SYSTEM: &str = "You are a senior business strategy analyst. \
Write specific, data-grounded insights. Cite the figures you are given and never invent numbers.";

pub const JUDGE_SYSTEM: &str = "You are a strict reviewer of business reports. \
You answer with a single JSON object and nothing else.";

/// Truncate to at most `max` characters, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn metrics_block(metrics: &MetricsMap) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- Total sales: ${:.0}", metrics.number("total_sales"));
    let _ = writeln!(out, "- Quarterly growth: {:.1}%", metrics.number("growth_rate"));
    let _ = writeln!(out, "- Top category: {}", metrics.text("top_category"));
    let _ = writeln!(out, "- Customer satisfaction: {:.1}/{SATISFACTION_SCALE}", metrics.number("satisfaction_score"));
    let _ = writeln!(out, "- Churn rate: {:.1}%", metrics.number("churn_rate"));
    let _ = writeln!(out, "- Top segment: {}", metrics.text("top_segment"));
    let _ = writeln!(out, "- Marketing ROI: {:.2}x", metrics.number("marketing_roi"));
    let _ = writeln!(out, "- Conversion rate: {:.1}%", metrics.number("conversion_rate"));
    let _ = writeln!(out, "- Best channel: {}", metrics.text("best_channel"));
    let _ = writeln!(out, "- Top product: {}", metrics.text("top_product"));
    let _ = writeln!(out, "- Profit margin: {:.1}%", metrics.number("profit_margin"));
    out
}

fn forces_block(forces: &CompetitiveForces) -> String {
    let mut out = String::new();
    for (name, force) in forces.named() {
        let _ = writeln!(out, "- {name}: {} ({})", force.level, force.rationale);
    }
    let _ = writeln!(
        out,
        "- Industry attractiveness: {} (average force score {:.2})",
        forces.attractiveness, forces.average_score
    );
    out
}

/// Prompt for a synthesis pass. Feedback, when present, steers the rewrite.
pub fn synthesis_prompt(
    metrics: &MetricsMap,
    forces: &CompetitiveForces,
    feedback: Option<&PriorFeedback>,
) -> String {
    let mut prompt = format!(
        "Based on this business data, provide 3 key insights and 3 actionable recommendations.\n\n\
         METRICS:\n{}\nCOMPETITIVE FORCES:\n{}\n",
        metrics_block(metrics),
        forces_block(forces)
    );

    if let Some(feedback) = feedback {
        let _ = write!(
            prompt,
            "REVIEWER FEEDBACK ON THE PREVIOUS DRAFT (iteration {}):\n{}\n\
             Rewrite the insights and recommendations so that every point above is addressed. \
             Replace generic statements with ones tied to the figures.\n",
            feedback.iteration,
            feedback.text.trim()
        );
    } else {
        prompt.push_str("Keep it concise and actionable.\n");
    }
    prompt
}

/// Prompt asking the judge for the twelve critique fields as JSON.
pub fn judge_prompt(
    report: &str,
    source_data: &str,
    iteration: u32,
    history: &[IterationRecord],
) -> String {
    let mut prompt = format!(
        "Analyze this business report against its source data and provide feedback in valid JSON format.\n\n\
         ITERATION: {iteration}\n\
         REPORT: {}\n\
         DATA: {}\n",
        truncate_chars(report, JUDGE_REPORT_CHARS),
        truncate_chars(source_data, JUDGE_DATA_CHARS),
    );

    if !history.is_empty() {
        prompt.push_str("PREVIOUS SCORES:\n");
        for record in history {
            let _ = writeln!(
                prompt,
                "- iteration {}: {:.2}",
                record.iteration, record.quality_score
            );
        }
    }

    prompt.push_str(
        r#"
Return ONLY this JSON structure:
{
    "quality_score": 0.75,
    "authenticity_score": 0.80,
    "data_integration_score": 0.70,
    "improvement_suggestions": ["suggestion1", "suggestion2"],
    "personalization_evidence": ["evidence1"],
    "generic_indicators": ["indicator1"],
    "key_inconsistencies": ["inconsistency1"],
    "anomalies": ["anomaly1"],
    "similarities": ["similarity1"],
    "overall_assessment": "brief assessment",
    "confidence_score": 0.85,
    "detailed_analysis": "brief analysis"
}
"#,
    );
    prompt
}

/// Deterministic narrative used when the model call fails or returns unusable text.
pub fn fallback_narrative(metrics: &MetricsMap, forces: &CompetitiveForces) -> String {
    let growth = metrics.number("growth_rate");
    let mut out = String::from("KEY INSIGHTS\n");
    let _ = writeln!(
        out,
        "1. Sales performance shows {growth:.1}% growth on ${:.0} total sales, led by {}.",
        metrics.number("total_sales"),
        metrics.text("top_category")
    );
    let _ = writeln!(
        out,
        "2. Customer satisfaction stands at {:.1}/{SATISFACTION_SCALE} with {:.1}% churn; {} is the leading segment.",
        metrics.number("satisfaction_score"),
        metrics.number("churn_rate"),
        metrics.text("top_segment")
    );
    let _ = writeln!(
        out,
        "3. Marketing returns {:.2}x on spend with a {:.1}% conversion rate.",
        metrics.number("marketing_roi"),
        metrics.number("conversion_rate")
    );

    out.push_str("\nRECOMMENDATIONS\n");
    let _ = writeln!(
        out,
        "1. Focus on {} optimization to {} growth.",
        metrics.text("top_category"),
        if growth < 5.0 { "restore" } else { "sustain" }
    );
    let _ = writeln!(
        out,
        "2. Address buyer power ({}) through retention programs for at-risk segments.",
        forces.buyer_power.level
    );
    let _ = writeln!(
        out,
        "3. Reallocate budget towards {} while competitive rivalry is {}.",
        metrics.text("best_channel"),
        forces.competitive_rivalry.level
    );
    out
}
