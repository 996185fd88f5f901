//! Plain-text report renderer.

use async_trait::async_trait;
use chrono::Utc;
use comfy_table::{presets::ASCII_FULL, Table};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{MetricsMap, ReportDocument, SATISFACTION_SCALE};
use crate::domain::ports::ReportRenderer;

/// How a key metric is displayed.
#[derive(Debug, Clone, Copy)]
enum MetricFormat {
    Currency,
    Percent,
    Ratio,
    Score,
    Count,
    Text,
}

const KEY_METRICS: [(&str, &str, MetricFormat); 12] = [
    ("Total sales", "total_sales", MetricFormat::Currency),
    ("Growth rate", "growth_rate", MetricFormat::Percent),
    ("Top category", "top_category", MetricFormat::Text),
    ("Customer satisfaction", "satisfaction_score", MetricFormat::Score),
    ("Churn rate", "churn_rate", MetricFormat::Percent),
    ("Top segment", "top_segment", MetricFormat::Text),
    ("Marketing ROI", "marketing_roi", MetricFormat::Ratio),
    ("Marketing spend", "marketing_spend", MetricFormat::Currency),
    ("Conversion rate", "conversion_rate", MetricFormat::Percent),
    ("Leads generated", "total_leads", MetricFormat::Count),
    ("Top product", "top_product", MetricFormat::Text),
    ("Profit margin", "profit_margin", MetricFormat::Percent),
];

/// Writes reports as `.txt` files under a fixed directory.
pub struct TextReportRenderer {
    output_dir: PathBuf,
}

impl TextReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Unique, timestamp-qualified artifact name.
    pub fn artifact_name() -> String {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%6f");
        let short = Uuid::new_v4().simple().to_string();
        format!("business_report_{stamp}_{}.txt", &short[..8])
    }
}

fn format_metric(metrics: &MetricsMap, key: &str, display: MetricFormat) -> String {
    if !metrics.contains(key) {
        return "N/A".to_string();
    }
    let n = metrics.number(key);
    match display {
        MetricFormat::Currency => format!("${}", group_thousands(n)),
        MetricFormat::Percent => format!("{n:.2}%"),
        MetricFormat::Ratio => format!("{n:.2}x"),
        MetricFormat::Score => format!("{n:.2}/{SATISFACTION_SCALE}"),
        MetricFormat::Count => group_thousands(n),
        MetricFormat::Text => metrics.text(key),
    }
}

fn group_thousands(n: f64) -> String {
    let rounded = n.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

/// Render the full text body of a report.
pub fn render_text(document: &ReportDocument) -> String {
    let mut out = String::new();
    out.push_str(&document.title);
    out.push('\n');
    out.push_str(&"=".repeat(document.title.chars().count()));
    out.push_str(&format!(
        "\nGenerated: {}\nIteration: {}\n\n",
        document.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        document.iteration
    ));

    out.push_str("KEY METRICS\n");
    let mut metrics = Table::new();
    metrics.load_preset(ASCII_FULL).set_header(vec!["Metric", "Value"]);
    for (label, key, display) in KEY_METRICS {
        metrics.add_row(vec![label.to_string(), format_metric(&document.metrics, key, display)]);
    }
    out.push_str(&metrics.to_string());
    out.push_str("\n\nCOMPETITIVE FORCES\n");

    let mut forces = Table::new();
    forces
        .load_preset(ASCII_FULL)
        .set_header(vec!["Force", "Level", "Score", "Rationale"]);
    for (name, force) in document.forces.named() {
        forces.add_row(vec![
            name.to_string(),
            force.level.to_string(),
            force.level.score().to_string(),
            force.rationale.clone(),
        ]);
    }
    out.push_str(&forces.to_string());
    out.push_str(&format!(
        "\nAverage force score: {:.2} | Industry attractiveness: {}\n\n",
        document.forces.average_score, document.forces.attractiveness
    ));

    out.push_str("STRATEGIC INSIGHTS\n");
    out.push_str(document.narrative.trim());
    out.push('\n');
    out
}

#[async_trait]
impl ReportRenderer for TextReportRenderer {
    #[instrument(skip(self, document), fields(iteration = document.iteration))]
    async fn render(&self, document: &ReportDocument) -> DomainResult<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| DomainError::RenderFailed(format!("{}: {e}", self.output_dir.display())))?;

        let path = self.output_dir.join(Self::artifact_name());
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| DomainError::RenderFailed(format!("{}: {e}", path.display())))?;
        file.write_all(render_text(document).as_bytes())
            .await
            .map_err(|e| DomainError::RenderFailed(e.to_string()))?;
        file.flush().await?;

        info!(path = %path.display(), "report rendered");
        Ok(path)
    }
}
