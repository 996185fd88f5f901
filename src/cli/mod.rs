//! Command-line surface around the report workflow.

pub mod commands;
pub mod display;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use output::{output, CommandOutput};

#[derive(Parser, Debug)]
#[command(name = "insight-loop")]
#[command(about = "Insight Loop - data-grounded business reports with a judge-and-refine loop", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (replaces .insight/config.yaml and .insight/local.yaml)
    #[arg(short, long, global = true, env = "INSIGHT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every CSV file in a directory into the business database
    Ingest(commands::ingest::IngestArgs),

    /// Show the tables and columns available to the canonical queries
    Schema,

    /// Generate a business report through the judge-and-refine loop
    Run(commands::run::RunArgs),
}

/// Print a command failure and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("{} {err}", console::style("error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  {} {cause}", console::style("caused by:").dim());
        }
    }
    std::process::exit(1);
}
