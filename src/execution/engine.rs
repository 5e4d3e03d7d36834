//! Backend Adapter Trait - Core contract for every connection type
//!
//! The registry only ever talks to a connection through this interface, so it
//! stays agnostic of whether rows come from Postgres, a SQLite file or a
//! sandboxed directory.

use crate::error::Result;
use crate::execution::result::QueryRows;
use async_trait::async_trait;

/// Column description used when rendering schema text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Adapter name (e.g., "postgres", "sqlite", "filesystem")
    fn name(&self) -> &'static str;

    /// Execute a read-only query and return rendered rows
    async fn query(&self, sql: &str) -> Result<QueryRows>;

    /// List the tables (or table-like objects) the connection exposes
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Schema text for all tables, or only for `table_filter` when given
    async fn get_schema(&self, table_filter: Option<&[String]>) -> Result<String>;
}

pub const NO_TABLES_FOUND: &str = "No tables found matching criteria.";

/// Render table schemas in the shared block format:
///
/// ```text
/// Table: orders
/// -------------
/// - id (integer)
/// - note (text) [NULLABLE]
/// ```
pub fn format_schema(tables: &[(String, Vec<ColumnInfo>)]) -> String {
    if tables.is_empty() {
        return NO_TABLES_FOUND.to_string();
    }

    let mut lines = Vec::new();
    for (idx, (table, columns)) in tables.iter().enumerate() {
        if idx > 0 {
            lines.push(String::new());
        }
        lines.push(format!("Table: {}", table));
        lines.push("-".repeat(table.chars().count() + 7));
        for col in columns {
            let mut line = format!("- {} ({})", col.name, col.data_type);
            if col.nullable {
                line.push_str(" [NULLABLE]");
            }
            lines.push(line);
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_schema_blocks() {
        let tables = vec![
            (
                "orders".to_string(),
                vec![
                    ColumnInfo { name: "id".into(), data_type: "integer".into(), nullable: false },
                    ColumnInfo { name: "note".into(), data_type: "text".into(), nullable: true },
                ],
            ),
            (
                "items".to_string(),
                vec![ColumnInfo { name: "sku".into(), data_type: "text".into(), nullable: false }],
            ),
        ];
        let text = format_schema(&tables);
        assert_eq!(
            text,
            "Table: orders\n-------------\n- id (integer)\n- note (text) [NULLABLE]\n\nTable: items\n------------\n- sku (text)"
        );
    }

    #[test]
    fn test_format_schema_empty() {
        assert_eq!(format_schema(&[]), NO_TABLES_FOUND);
    }
}
