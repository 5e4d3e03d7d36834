//! Query-Execution Gateway
//!
//! The workflow's only way to reach a backend. Queries pass the SQL safety
//! validator before any adapter sees them, and every backend call runs under
//! the step timeout.

use crate::connections::ConnectionRegistry;
use crate::error::{AgentError, Result};
use crate::execution::result::{FailureKind, ToolOutput};
use crate::security::validate_sql;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const NO_CONNECTIONS: &str = "No connections configured.";

pub const MAX_SAMPLE_ROWS: i64 = 20;

#[derive(Clone)]
pub struct QueryGateway {
    registry: Arc<ConnectionRegistry>,
    timeout: Duration,
}

impl QueryGateway {
    pub fn new(registry: Arc<ConnectionRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    async fn within<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| AgentError::Timeout(self.timeout.as_secs()))?
    }

    /// Validate and run `sql` on one connection.
    pub async fn run_query(&self, connection_id: &str, sql: &str) -> ToolOutput {
        if let Err(e) = validate_sql(sql) {
            warn!("Rejected query on {}: {}", connection_id, e);
            return ToolOutput::failure(FailureKind::Security, e.to_string());
        }

        let handle = match self.registry.adapter(connection_id) {
            Ok(handle) => handle,
            Err(e) => return ToolOutput::failure(FailureKind::General, e.to_string()),
        };

        debug!("Running query on {}: {}", connection_id, sql);
        match tokio::time::timeout(self.timeout, handle.backend().query(sql)).await {
            Ok(Ok(rows)) => {
                info!("Query on {} returned {} rows", connection_id, rows.rows.len());
                ToolOutput::from_rows(rows)
            }
            Ok(Err(e)) => {
                error!("Query execution error on {}: {}", connection_id, e);
                ToolOutput::failure(FailureKind::Database, e.to_string())
            }
            Err(_) => {
                error!("Query on {} timed out", connection_id);
                ToolOutput::failure(
                    FailureKind::General,
                    AgentError::Timeout(self.timeout.as_secs()).to_string(),
                )
            }
        }
    }

    /// Schema text for every connection, one headed block each. A failing
    /// connection renders its error inline without affecting the others.
    pub async fn get_schema(&self, table_filter: Option<&[String]>) -> String {
        let entries = self.registry.list();
        if entries.is_empty() {
            return NO_CONNECTIONS.to_string();
        }

        let mut blocks = Vec::with_capacity(entries.len());
        for entry in entries {
            let text = match self.connection_schema(&entry.id, table_filter).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Schema retrieval failed for {}: {}", entry.id, e);
                    format!("Error retrieving schema: {}", e)
                }
            };
            blocks.push(format!("=== {} ({}) ===\n{}", entry.display_name, entry.id, text));
        }
        blocks.join("\n\n")
    }

    async fn connection_schema(&self, id: &str, table_filter: Option<&[String]>) -> Result<String> {
        let cacheable = table_filter.is_none();
        if cacheable {
            if let Some(text) = self.registry.cached_schema(id) {
                return Ok(text);
            }
        }

        let generation = self.registry.schema_generation(id);
        let handle = self.registry.adapter(id)?;
        let text = self.within(handle.backend().get_schema(table_filter)).await?;
        if cacheable {
            self.registry.set_cached_schema_if_current(id, text.clone(), generation);
        }
        Ok(text)
    }

    pub async fn list_tables(&self, connection_id: &str) -> Result<Vec<String>> {
        let handle = self.registry.adapter(connection_id)?;
        self.within(handle.backend().list_tables()).await
    }

    /// First `limit` rows (clamped to 1..=20) of a table that must exist.
    pub async fn sample_rows(&self, connection_id: &str, table: &str, limit: i64) -> ToolOutput {
        let limit = limit.clamp(1, MAX_SAMPLE_ROWS);

        let tables = match self.list_tables(connection_id).await {
            Ok(tables) => tables,
            Err(e) => {
                return ToolOutput::failure(
                    FailureKind::General,
                    format!("Error retrieving sample data: {}", e),
                )
            }
        };
        if !tables.iter().any(|t| t == table) {
            return ToolOutput::failure(
                FailureKind::General,
                format!("Table '{}' does not exist.", table),
            );
        }

        let sql = format!("SELECT * FROM \"{}\" LIMIT {}", table.replace('"', "\"\""), limit);
        self.run_query(connection_id, &sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSettings;
    use crate::connections::{ConnectionEntry, ConnectionType};
    use crate::execution::engine::BackendAdapter;
    use crate::execution::result::QueryRows;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAdapter {
        schema_calls: AtomicUsize,
    }

    #[async_trait]
    impl BackendAdapter for CountingAdapter {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn query(&self, sql: &str) -> Result<QueryRows> {
            if sql.contains("missing_col") {
                return Err(AgentError::Backend("column \"missing_col\" does not exist".to_string()));
            }
            if sql.contains("nothing") {
                return Ok(QueryRows::default());
            }
            Ok(QueryRows::new(vec!["n".to_string()], vec![vec!["1".to_string()]]))
        }

        async fn list_tables(&self) -> Result<Vec<String>> {
            Ok(vec!["customers".to_string()])
        }

        async fn get_schema(&self, _table_filter: Option<&[String]>) -> Result<String> {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            Ok("Table: customers".to_string())
        }
    }

    fn gateway() -> (QueryGateway, Arc<CountingAdapter>) {
        let registry = Arc::new(ConnectionRegistry::new(
            DatabaseSettings::default(),
            Duration::from_secs(60),
        ));
        let adapter = Arc::new(CountingAdapter { schema_calls: AtomicUsize::new(0) });
        registry
            .add_with_adapter(
                ConnectionEntry::new("main", ConnectionType::Postgres, "Main"),
                adapter.clone(),
            )
            .unwrap();
        (QueryGateway::new(registry, Duration::from_secs(5)), adapter)
    }

    #[tokio::test]
    async fn test_run_query_classifies_outcomes() {
        let (gw, _) = gateway();

        let rejected = gw.run_query("main", "DROP TABLE customers").await;
        assert_eq!(rejected.render(), "Security Violation: Only SELECT statements are allowed.");

        let failed = gw.run_query("main", "SELECT missing_col FROM customers").await;
        assert!(failed.render().starts_with("Database Error:"));

        let unknown = gw.run_query("nowhere", "SELECT 1").await;
        assert!(matches!(unknown, ToolOutput::Failure { kind: FailureKind::General, .. }));

        assert_eq!(gw.run_query("main", "SELECT nothing").await, ToolOutput::Empty);
        assert!(matches!(gw.run_query("main", "SELECT 1").await, ToolOutput::Table(_)));
    }

    #[tokio::test]
    async fn test_unfiltered_schema_is_cached() {
        let (gw, adapter) = gateway();
        let first = gw.get_schema(None).await;
        let second = gw.get_schema(None).await;
        assert_eq!(first, "=== Main (main) ===\nTable: customers");
        assert_eq!(first, second);
        assert_eq!(adapter.schema_calls.load(Ordering::SeqCst), 1);

        gw.get_schema(Some(&["customers".to_string()])).await;
        assert_eq!(adapter.schema_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sample_rows_requires_known_table() {
        let (gw, _) = gateway();
        let missing = gw.sample_rows("main", "secrets", 5).await;
        assert_eq!(missing.render(), "Error: Table 'secrets' does not exist.");
        assert!(matches!(gw.sample_rows("main", "customers", 500).await, ToolOutput::Table(_)));
    }

    #[tokio::test]
    async fn test_no_connections() {
        let registry = Arc::new(ConnectionRegistry::new(
            DatabaseSettings::default(),
            Duration::from_secs(60),
        ));
        let gw = QueryGateway::new(registry, Duration::from_secs(5));
        assert_eq!(gw.get_schema(None).await, NO_CONNECTIONS);
    }
}
