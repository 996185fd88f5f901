//! SQLite implementation of the DataStore, QueryExecutor and TableWriter ports.

use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Column, Row as _, SqlitePool, TypeInfo, ValueRef};
use tracing::{debug, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ColumnInfo, QueryOutcome, Row, TableData, TableSchema};
use crate::domain::ports::{DataStore, QueryExecutor, TableWriter};

use super::connection::verify_connection;

/// Leading keywords of statements that return rows.
const ROW_RETURNING: [&str; 5] = ["SELECT", "WITH", "PRAGMA", "VALUES", "EXPLAIN"];

#[derive(Clone)]
pub struct SqliteDataStore {
    pool: SqlitePool,
}

impl SqliteDataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Whether `sql` produces a result set rather than an affected-row count.
pub fn returns_rows(sql: &str) -> bool {
    let first = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    ROW_RETURNING.contains(&first.as_str())
}

/// Quote an identifier for interpolation into DDL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn decode_row(row: &SqliteRow) -> Row {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode_value(row, idx));
    }
    out
}

/// Map one cell to a JSON scalar by its runtime storage class.
fn decode_value(row: &SqliteRow, idx: usize) -> Value {
    let storage = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => row
            .try_get_unchecked::<i64, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get_unchecked::<f64, _>(idx)
            .ok()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(idx)
            .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(Value::Null),
        _ => row
            .try_get_unchecked::<String, _>(idx)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn bind_value(args: &mut SqliteArguments<'_>, value: &Value) {
    match value {
        Value::Null => args.add(None::<String>),
        Value::Bool(b) => args.add(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                args.add(i);
            } else {
                args.add(n.as_f64().unwrap_or_default());
            }
        }
        Value::String(s) => args.add(s.clone()),
        other => args.add(other.to_string()),
    }
}

#[async_trait]
impl QueryExecutor for SqliteDataStore {
    #[instrument(skip(self, sql), fields(sql = %sql.chars().take(80).collect::<String>()))]
    async fn execute(&self, sql: &str) -> DomainResult<QueryOutcome> {
        if returns_rows(sql) {
            match sqlx::query(sql).fetch_all(&self.pool).await {
                Ok(rows) => {
                    debug!(rows = rows.len(), "query returned rows");
                    Ok(QueryOutcome::Rows {
                        rows: rows.iter().map(decode_row).collect(),
                    })
                }
                Err(err) => classify_failure(err, sql),
            }
        } else {
            match sqlx::query(sql).execute(&self.pool).await {
                Ok(done) => Ok(QueryOutcome::Affected {
                    rows_affected: done.rows_affected(),
                }),
                Err(err) => classify_failure(err, sql),
            }
        }
    }
}

/// Statement errors become outcomes; pool failures surface as `Err`.
fn classify_failure(err: sqlx::Error, sql: &str) -> DomainResult<QueryOutcome> {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            Err(DomainError::DataStoreUnavailable(err.to_string()))
        }
        other => Ok(QueryOutcome::error(other.to_string(), sql)),
    }
}

#[async_trait]
impl DataStore for SqliteDataStore {
    async fn ping(&self) -> DomainResult<()> {
        verify_connection(&self.pool).await.map_err(DomainError::from)
    }

    async fn schema(&self) -> DomainResult<Vec<TableSchema>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let rows = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(&name)))
                .fetch_all(&self.pool)
                .await?;
            let columns = rows
                .iter()
                .map(|row| -> DomainResult<ColumnInfo> {
                    Ok(ColumnInfo {
                        name: row.try_get("name")?,
                        data_type: row.try_get("type")?,
                    })
                })
                .collect::<DomainResult<Vec<_>>>()?;
            tables.push(TableSchema { name, columns });
        }
        Ok(tables)
    }
}

#[async_trait]
impl TableWriter for SqliteDataStore {
    #[instrument(skip(self, table), fields(table = %table.name, rows = table.rows.len()))]
    async fn replace_table(&self, table: &TableData) -> DomainResult<u64> {
        if table.columns.is_empty() {
            return Err(DomainError::ValidationFailed(format!(
                "table '{}' has no columns",
                table.name
            )));
        }

        let ident = quote_ident(&table.name);
        let column_defs = table
            .columns
            .iter()
            .map(|(name, affinity)| format!("{} {}", quote_ident(name), affinity.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; table.columns.len()].join(", ");
        let insert_sql = format!("INSERT INTO {ident} VALUES ({placeholders})");

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {ident}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("CREATE TABLE {ident} ({column_defs})"))
            .execute(&mut *tx)
            .await?;

        let mut written = 0u64;
        for row in &table.rows {
            let mut args = SqliteArguments::default();
            for idx in 0..table.columns.len() {
                bind_value(&mut args, row.get(idx).unwrap_or(&Value::Null));
            }
            written += sqlx::query_with(&insert_sql, args)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        debug!(written, "table replaced");
        Ok(written)
    }
}
