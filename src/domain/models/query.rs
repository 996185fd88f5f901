//! Query execution and schema types shared by the data store boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A result row: column name to scalar, in select-list order.
pub type Row = Map<String, Value>;

/// Outcome of executing one statement against the data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Row-returning statement; may be empty.
    Rows { rows: Vec<Row> },
    /// Statement that does not return rows.
    Affected { rows_affected: u64 },
    /// Execution failed; the attempted query is kept for diagnosis.
    Error { error: String, query: String },
}

impl QueryOutcome {
    pub fn error(error: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            query: query.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// One column of an introspected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// An introspected table with its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Render a schema listing as plain text.
pub fn describe_schema(tables: &[TableSchema]) -> String {
    let mut out = String::new();
    for table in tables {
        out.push_str(&format!("Table '{}':\n", table.name));
        for column in &table.columns {
            out.push_str(&format!("  - {} ({})\n", column.name, column.data_type));
        }
        out.push('\n');
    }
    out
}

/// Column affinity used when creating ingested tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnAffinity {
    Integer,
    Real,
    Text,
}

impl ColumnAffinity {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

/// A fully materialized table ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<(String, ColumnAffinity)>,
    pub rows: Vec<Vec<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_schema() {
        let tables = vec![TableSchema {
            name: "customer_segments".to_string(),
            columns: vec![
                ColumnInfo {
                    name: "segment".to_string(),
                    data_type: "TEXT".to_string(),
                },
                ColumnInfo {
                    name: "satisfaction_score".to_string(),
                    data_type: "REAL".to_string(),
                },
            ],
        }];

        let text = describe_schema(&tables);
        assert!(text.starts_with("Table 'customer_segments':\n"));
        assert!(text.contains("  - segment (TEXT)\n"));
        assert!(text.contains("  - satisfaction_score (REAL)\n"));
    }

    #[test]
    fn test_outcome_serialization_tag() {
        let outcome = QueryOutcome::error("no such table: x", "SELECT * FROM x");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["query"], "SELECT * FROM x");
        assert!(outcome.is_error());
    }
}
