//! `run` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::display::{colorize_score, colorize_status, list_table};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, MessageRole, WorkflowState};
use crate::infrastructure::config::ConfigLoader;
use crate::services::build_workflow;

const DEFAULT_REQUEST: &str = "Generate a comprehensive business performance report";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Free-text report request
    #[arg(default_value = DEFAULT_REQUEST)]
    pub request: String,

    /// Override iteration.max_iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override iteration.quality_threshold
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Print the final narrative after the summary
    #[arg(long)]
    pub show_report: bool,
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    #[serde(flatten)]
    pub state: WorkflowState,
    #[serde(skip)]
    pub threshold: f64,
    #[serde(skip)]
    pub show_report: bool,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let state = &self.state;
        let summary = state
            .judge_analysis
            .as_ref()
            .and_then(|a| a.iteration_summary.as_ref());

        let mut lines = vec![
            format!("Run: {}", state.run_id),
            format!("Iterations: {}", state.iteration_count),
            format!(
                "Final quality: {}",
                colorize_score(state.final_quality_score, self.threshold)
            ),
        ];
        if let Some(summary) = summary {
            lines.push(format!("Stopped: {}", summary.stop_reason));
            let trajectory: Vec<String> =
                summary.score_trajectory.iter().map(|s| format!("{s:.2}")).collect();
            lines.push(format!("Score trajectory: {}", trajectory.join(" -> ")));
        }
        match &state.report_artifact_path {
            Some(path) => lines.push(format!("Report: {}", path.display())),
            None => lines.push("Report: not produced".to_string()),
        }

        if let Some(data) = &state.source_data {
            lines.push(format!("\nData: {}", data.summary));
            let mut table = list_table(&["request", "template", "status"]);
            for outcome in &data.results {
                table.add_row(vec![
                    truncate(&outcome.request, 48),
                    outcome.template.to_string(),
                    colorize_status(outcome.status.as_str()).to_string(),
                ]);
            }
            lines.push(table.to_string());
        }

        let errors: Vec<&str> = state
            .conversation
            .iter()
            .filter(|m| m.role == MessageRole::Error)
            .map(|m| m.content.as_str())
            .collect();
        if !errors.is_empty() {
            lines.push("\nStage errors:".to_string());
            lines.extend(errors.iter().map(|e| format!("  - {e}")));
        }

        if self.show_report && !state.report_text.is_empty() {
            lines.push(format!("\n{}", state.report_text.trim()));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(max) = args.max_iterations {
        config.iteration.max_iterations = max;
    }
    if let Some(threshold) = args.threshold {
        config.iteration.quality_threshold = threshold;
    }
    ConfigLoader::validate(&config)?;

    let controller = build_workflow(&config)
        .await
        .context("Failed to assemble the report workflow")?;
    let state = controller
        .run(&args.request)
        .await
        .context("Workflow could not start")?;

    let out = RunOutput {
        state,
        threshold: config.iteration.quality_threshold,
        show_report: args.show_report,
    };
    output(&out, json_mode);
    Ok(())
}
