//! `schema` command.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::display::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, TableSchema};
use crate::domain::ports::DataStore;
use crate::services::open_store;

#[derive(Debug, Serialize)]
pub struct SchemaOutput {
    pub database: String,
    pub tables: Vec<TableSchema>,
}

impl CommandOutput for SchemaOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["table", "column", "type"]);
        for schema in &self.tables {
            for (i, column) in schema.columns.iter().enumerate() {
                let name = if i == 0 { schema.name.as_str() } else { "" };
                table.add_row(vec![name, column.name.as_str(), column.data_type.as_str()]);
            }
        }
        render_list("table", &table, self.tables.len())
    }
}

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let store = open_store(config)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    let tables = store.schema().await.context("Failed to read schema")?;

    let out = SchemaOutput {
        database: config.database.path.clone(),
        tables,
    };
    output(&out, json_mode);
    Ok(())
}
