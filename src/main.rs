//! Insight Loop CLI entry point.

use anyhow::Result;
use clap::Parser;

use insight_loop::cli::commands::{self, load_config};
use insight_loop::cli::{handle_error, Cli, Commands};
use insight_loop::infrastructure::logging::LoggerImpl;

async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args, &config, cli.json).await,
        Commands::Schema => commands::schema::execute(&config, cli.json).await,
        Commands::Run(args) => commands::run::execute(args, &config, cli.json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = dispatch(cli).await {
        handle_error(err, json);
    }
}
