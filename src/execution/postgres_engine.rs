//! Postgres adapter backed by a lazily connected sqlx pool.
//!
//! Rows are fetched through `row_to_json` so every column type renders to
//! text without a per-type decode table. Values are read back by position,
//! so repeated output names (`a.id, b.id`) keep their own values; column
//! names come from preparing the statement itself.

use crate::error::Result;
use crate::execution::engine::{format_schema, BackendAdapter, ColumnInfo};
use crate::execution::result::QueryRows;
use async_trait::async_trait;
use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Column, Executor, Row, Statement};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

const LIST_TABLES_SQL: &str = "SELECT table_name::text AS table_name \
     FROM information_schema.tables \
     WHERE table_schema = 'public' \
     ORDER BY table_name";

const COLUMNS_SQL: &str = "SELECT table_name::text AS table_name, column_name::text AS column_name, \
     data_type::text AS data_type, is_nullable::text AS is_nullable \
     FROM information_schema.columns \
     WHERE table_schema = 'public'";

const COLUMNS_ORDER: &str = " ORDER BY table_name, ordinal_position";

pub struct PostgresEngine {
    pool: PgPool,
}

impl PostgresEngine {
    /// Build the pool without opening a connection; the first query connects.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl BackendAdapter for PostgresEngine {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn query(&self, sql: &str) -> Result<QueryRows> {
        let statement = sql.trim().trim_end_matches(';');
        debug!("Postgres query: {}", statement);

        let prepared = (&self.pool).prepare(statement).await?;
        let columns: Vec<String> = prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let wrapped = wrap_statement(statement);
        let json_rows: Vec<String> = sqlx::query_scalar(&wrapped).fetch_all(&self.pool).await?;

        let rows = json_rows
            .iter()
            .map(|raw| decode_row(raw))
            .collect::<Result<Vec<_>>>()?;

        info!("Postgres returned {} rows", rows.len());
        Ok(QueryRows::new(columns, rows))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables: Vec<String> = sqlx::query_scalar(LIST_TABLES_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(tables)
    }

    async fn get_schema(&self, table_filter: Option<&[String]>) -> Result<String> {
        let rows = match table_filter {
            Some(tables) => {
                let sql = format!("{} AND table_name = ANY($1){}", COLUMNS_SQL, COLUMNS_ORDER);
                sqlx::query(&sql)
                    .bind(tables.to_vec())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{}{}", COLUMNS_SQL, COLUMNS_ORDER);
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };

        let mut tables: Vec<(String, Vec<ColumnInfo>)> = Vec::new();
        for row in rows {
            let table: String = row.try_get("table_name")?;
            let column = ColumnInfo {
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
                nullable: row.try_get::<String, _>("is_nullable")? == "YES",
            };
            let same_table = tables.last().map_or(false, |(current, _)| *current == table);
            if same_table {
                if let Some((_, cols)) = tables.last_mut() {
                    cols.push(column);
                }
            } else {
                tables.push((table, vec![column]));
            }
        }

        Ok(format_schema(&tables))
    }
}

/// The closing parenthesis sits on its own line so a trailing `-- comment`
/// cannot swallow it.
fn wrap_statement(statement: &str) -> String {
    format!("SELECT row_to_json(q)::text FROM (\n{}\n) AS q", statement)
}

/// Values of one `row_to_json` object in output order, duplicates included
struct OrderedValues(Vec<Value>);

impl<'de> Deserialize<'de> for OrderedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ValuesVisitor;

        impl<'de> Visitor<'de> for ValuesVisitor {
            type Value = OrderedValues;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<OrderedValues, A::Error> {
                let mut values = Vec::new();
                while let Some((_, value)) = map.next_entry::<IgnoredAny, Value>()? {
                    values.push(value);
                }
                Ok(OrderedValues(values))
            }
        }

        deserializer.deserialize_map(ValuesVisitor)
    }
}

fn decode_row(raw: &str) -> Result<Vec<String>> {
    let OrderedValues(values) = serde_json::from_str(raw)?;
    Ok(values.iter().map(render_json_value).collect())
}

fn render_json_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
