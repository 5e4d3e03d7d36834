//! SQLite adapter for embedded database files.
//!
//! The file is opened read-only for every call and all rusqlite work runs on
//! the blocking pool.

use crate::error::{AgentError, Result};
use crate::execution::engine::{format_schema, BackendAdapter, ColumnInfo};
use crate::execution::result::QueryRows;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct SqliteEngine {
    path: PathBuf,
}

impl SqliteEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = open_read_only(&path)?;
            op(&conn)
        })
        .await
        .map_err(|e| AgentError::Backend(format!("SQLite worker failed: {}", e)))?
    }
}

fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl BackendAdapter for SqliteEngine {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn query(&self, sql: &str) -> Result<QueryRows> {
        debug!("SQLite query on {}: {}", self.path.display(), sql);
        let sql = sql.to_string();
        let rows = self
            .blocking(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let columns: Vec<String> =
                    stmt.column_names().into_iter().map(String::from).collect();
                let width = columns.len();

                let mut rows = Vec::new();
                let mut cursor = stmt.query([])?;
                while let Some(row) = cursor.next()? {
                    let mut rendered = Vec::with_capacity(width);
                    for idx in 0..width {
                        rendered.push(render_value(row.get_ref(idx)?));
                    }
                    rows.push(rendered);
                }
                Ok(QueryRows::new(columns, rows))
            })
            .await?;
        info!("SQLite returned {} rows", rows.rows.len());
        Ok(rows)
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.blocking(|conn| table_names(conn)).await
    }

    async fn get_schema(&self, table_filter: Option<&[String]>) -> Result<String> {
        let filter: Option<Vec<String>> = table_filter.map(|t| t.to_vec());
        self.blocking(move |conn| {
            let mut tables = Vec::new();
            // Only names that actually exist reach the PRAGMA
            for table in table_names(conn)? {
                if let Some(wanted) = &filter {
                    if !wanted.iter().any(|w| w.eq_ignore_ascii_case(&table)) {
                        continue;
                    }
                }
                let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&table)))?;
                let columns = stmt
                    .query_map([], |row| {
                        let data_type: String = row.get(2)?;
                        Ok(ColumnInfo {
                            name: row.get(1)?,
                            data_type: if data_type.is_empty() { "ANY".to_string() } else { data_type },
                            nullable: row.get::<_, i64>(3)? == 0,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                tables.push((table, columns));
            }
            Ok(format_schema(&tables))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("shop.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT);
             INSERT INTO customers (name, city) VALUES ('Ada', 'London'), ('Linus', NULL);
             CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER, total REAL);",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_query_renders_rows_in_column_order() {
        let dir = TempDir::new().unwrap();
        let engine = SqliteEngine::new(seed(&dir));

        let rows = engine
            .query("SELECT name, city FROM customers ORDER BY id")
            .await
            .unwrap();
        assert_eq!(rows.columns, vec!["name", "city"]);
        assert_eq!(rows.rows[0], vec!["Ada", "London"]);
        assert_eq!(rows.rows[1], vec!["Linus", "NULL"]);
    }

    #[tokio::test]
    async fn test_connection_is_read_only() {
        let dir = TempDir::new().unwrap();
        let engine = SqliteEngine::new(seed(&dir));
        let err = engine.query("DELETE FROM customers").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_list_tables_and_filtered_schema() {
        let dir = TempDir::new().unwrap();
        let engine = SqliteEngine::new(seed(&dir));

        assert_eq!(engine.list_tables().await.unwrap(), vec!["customers", "orders"]);

        let schema = engine
            .get_schema(Some(&["customers".to_string()]))
            .await
            .unwrap();
        assert!(schema.starts_with("Table: customers"));
        assert!(schema.contains("- name (TEXT)"));
        assert!(schema.contains("- city (TEXT) [NULLABLE]"));
        assert!(!schema.contains("orders"));
    }

    #[tokio::test]
    async fn test_missing_file_is_backend_error() {
        let engine = SqliteEngine::new("/definitely/not/here.db");
        assert!(matches!(engine.list_tables().await, Err(AgentError::Backend(_))));
    }
}
