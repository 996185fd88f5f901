//! CSV ingestion into the business data store.
//!
//! Every `*.csv` file in a directory becomes one table named after the
//! lower-cased file stem. A failing file is reported and skipped; the rest
//! of the batch still loads.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ColumnAffinity, TableData};
use crate::domain::ports::TableWriter;

/// One successfully loaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedTable {
    pub table: String,
    pub path: PathBuf,
    pub rows: u64,
    pub columns: Vec<(String, ColumnAffinity)>,
}

/// One file that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of ingesting a directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub loaded: Vec<LoadedTable>,
    pub failures: Vec<IngestionFailure>,
}

impl IngestionReport {
    pub fn total_rows(&self) -> u64 {
        self.loaded.iter().map(|t| t.rows).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Normalize a header or file stem into a column/table identifier.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

fn infer_affinity<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnAffinity {
    let mut affinity = ColumnAffinity::Integer;
    let mut seen = false;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        seen = true;
        if affinity == ColumnAffinity::Integer && cell.parse::<i64>().is_ok() {
            continue;
        }
        if cell.parse::<f64>().is_ok_and(f64::is_finite) {
            affinity = ColumnAffinity::Real;
            continue;
        }
        return ColumnAffinity::Text;
    }
    if seen {
        affinity
    } else {
        ColumnAffinity::Text
    }
}

fn convert_cell(cell: &str, affinity: ColumnAffinity) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    match affinity {
        ColumnAffinity::Integer => cell
            .parse::<i64>()
            .map_or_else(|_| Value::String(cell.to_string()), Value::from),
        ColumnAffinity::Real => cell
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(cell.to_string()), Value::Number),
        ColumnAffinity::Text => Value::String(cell.to_string()),
    }
}

/// Parse CSV bytes into a table named `table`.
pub fn parse_csv(table: &str, bytes: &[u8]) -> DomainResult<TableData> {
    let failed = |reason: String| DomainError::IngestionFailed {
        path: table.to_string(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| failed(format!("failed to read header row: {e}")))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let name = normalize_identifier(h);
            if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name
            }
        })
        .collect();

    if headers.is_empty() {
        return Err(failed("no columns in header row".to_string()));
    }
    for (i, name) in headers.iter().enumerate() {
        if headers[..i].contains(name) {
            return Err(failed(format!("duplicate column '{name}'")));
        }
    }

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| failed(format!("row {}: {e}", line + 1)))?;
        let cells: Vec<String> = (0..headers.len())
            .map(|i| record.get(i).unwrap_or_default().to_string())
            .collect();
        records.push(cells);
    }

    let columns: Vec<(String, ColumnAffinity)> = headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let affinity = infer_affinity(records.iter().map(|r| r[i].as_str()));
            (name, affinity)
        })
        .collect();

    let rows = records
        .iter()
        .map(|cells| {
            cells
                .iter()
                .zip(&columns)
                .map(|(cell, (_, affinity))| convert_cell(cell, *affinity))
                .collect()
        })
        .collect();

    Ok(TableData {
        name: table.to_string(),
        columns,
        rows,
    })
}

/// Loads CSV files through a [`TableWriter`].
pub struct IngestionService {
    writer: Arc<dyn TableWriter>,
}

impl IngestionService {
    pub fn new(writer: Arc<dyn TableWriter>) -> Self {
        Self { writer }
    }

    /// Load one CSV file, replacing the table of the same name.
    pub async fn ingest_file(&self, path: &Path) -> DomainResult<LoadedTable> {
        let table = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(normalize_identifier)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::IngestionFailed {
                path: path.display().to_string(),
                reason: "file name has no usable stem".to_string(),
            })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::IngestionFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let data = parse_csv(&table, &bytes)?;
        let rows = self.writer.replace_table(&data).await?;

        info!(table = %table, rows, path = %path.display(), "table loaded");
        Ok(LoadedTable {
            table,
            path: path.to_path_buf(),
            rows,
            columns: data.columns,
        })
    }

    /// Load every `*.csv` file in `dir`, in file name order.
    ///
    /// Fails only when the directory itself cannot be read.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn ingest_directory(&self, dir: &Path) -> DomainResult<IngestionReport> {
        let unreadable = |e: std::io::Error| DomainError::IngestionFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
            let path = entry.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut report = IngestionReport::default();
        for path in paths {
            match self.ingest_file(&path).await {
                Ok(loaded) => report.loaded.push(loaded),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping file");
                    report.failures.push(IngestionFailure {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if report.loaded.is_empty() && report.failures.is_empty() {
            warn!("no CSV files found");
        }
        Ok(report)
    }
}
