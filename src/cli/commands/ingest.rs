//! `ingest` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::display::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::{build_ingestion, open_store, IngestionReport};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Directory containing CSV files
    pub dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub success: bool,
    pub directory: String,
    pub total_rows: u64,
    #[serde(flatten)]
    pub report: IngestionReport,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["table", "rows", "columns", "file"]);
        for loaded in &self.report.loaded {
            table.add_row(vec![
                loaded.table.clone(),
                loaded.rows.to_string(),
                loaded.columns.len().to_string(),
                loaded.path.display().to_string(),
            ]);
        }

        let mut out = render_list("table", &table, self.report.loaded.len());
        if !self.report.failures.is_empty() {
            out.push_str(&format!(
                "\n\n{} file(s) failed:",
                console::style(self.report.failures.len()).red().bold()
            ));
            for failure in &self.report.failures {
                out.push_str(&format!("\n  - {}: {}", failure.path.display(), failure.reason));
            }
        }
        out
    }
}

pub async fn execute(args: IngestArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_store(config)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    let service = build_ingestion(store);

    let report = service
        .ingest_directory(&args.dir)
        .await
        .with_context(|| format!("Failed to ingest {}", args.dir.display()))?;

    let out = IngestOutput {
        success: report.is_clean(),
        directory: args.dir.display().to_string(),
        total_rows: report.total_rows(),
        report,
    };
    output(&out, json_mode);
    Ok(())
}
