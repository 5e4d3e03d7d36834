//! Query execution: backend adapters, result rendering and the gateway.

pub mod engine;
pub mod filesystem_engine;
pub mod gateway;
pub mod postgres_engine;
pub mod result;
pub mod sqlite_engine;

pub use engine::{format_schema, BackendAdapter, ColumnInfo, NO_TABLES_FOUND};
pub use filesystem_engine::FilesystemEngine;
pub use gateway::QueryGateway;
pub use postgres_engine::PostgresEngine;
pub use result::{contains_error_sentinel, FailureKind, QueryRows, Row, ToolOutput, NO_RESULTS};
pub use sqlite_engine::SqliteEngine;
