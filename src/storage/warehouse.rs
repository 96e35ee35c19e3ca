//! SQLite-backed warehouse.
//!
//! Tables are named after their full three-part identifier, quoted, so
//! `proj.crm.threads` lives in a table literally called `"proj.crm.threads"`.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::params_from_iter;

use super::sink::{RecordSink, Result, SinkError, TableData, TableId};
use super::Database;
use crate::domain::normalize_domain;

/// Quotes an identifier for use in SQL.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Warehouse tables stored in a single SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteWarehouse {
    db: Database,
}

impl SqliteWarehouse {
    /// Opens (or creates) the warehouse at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            db: Database::open(path).await?,
        })
    }

    /// Creates a warehouse backed by an in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory().await?,
        })
    }

    /// Returns a reference to the underlying database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Reads the distinct monitored domains from `column` of `table`.
    ///
    /// Values are normalized (scheme and trailing slash stripped) and
    /// deduplicated after normalization; empty values are skipped.
    pub async fn distinct_domains(&self, table: &TableId, column: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM {tbl} WHERE {col} IS NOT NULL",
            col = quote_ident(column),
            tbl = quote_ident(&table.to_string()),
        );

        let raw: Vec<String> = self
            .db
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
            })
            .await?;

        let mut domains: Vec<String> = raw
            .iter()
            .map(|d| normalize_domain(d))
            .filter(|d| !d.is_empty())
            .collect();
        domains.sort();
        domains.dedup();

        tracing::info!(table = %table, count = domains.len(), "loaded monitored domains");
        Ok(domains)
    }

    /// Counts the rows of `table`.
    pub async fn row_count(&self, table: &TableId) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&table.to_string()));
        Ok(self
            .db
            .with_conn(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
            .await?)
    }
}

#[async_trait]
impl RecordSink for SqliteWarehouse {
    async fn replace(&self, table: &TableId, data: TableData) -> Result<usize> {
        let width = data.columns.len();
        if width == 0 {
            return Err(SinkError::InvalidDestination(format!(
                "{} has no columns",
                table
            )));
        }
        if let Some(row) = data.rows.iter().find(|r| r.len() != width) {
            return Err(SinkError::RowShape {
                table: table.to_string(),
                expected: width,
                actual: row.len(),
            });
        }

        let name = quote_ident(&table.to_string());
        let column_defs = data
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(c.name), c.kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        let column_names = data
            .columns
            .iter()
            .map(|c| quote_ident(c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=width)
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let drop_sql = format!("DROP TABLE IF EXISTS {}", name);
        let create_sql = format!("CREATE TABLE {} ({})", name, column_defs);
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            name, column_names, placeholders
        );

        // A failure anywhere rolls back and leaves the previous table.
        let written = self
            .db
            .transaction(move |tx| {
                tx.execute(&drop_sql, [])?;
                tx.execute(&create_sql, [])?;
                let mut stmt = tx.prepare(&insert_sql)?;
                for row in &data.rows {
                    stmt.execute(params_from_iter(row.iter()))?;
                }
                Ok(data.rows.len())
            })
            .await?;

        tracing::info!(table = %table, rows = written, "replaced warehouse table");
        Ok(written)
    }
}
