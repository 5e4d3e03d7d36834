//! Runtime Settings
//!
//! Everything is read from the environment (after `.env` has been loaded by
//! the binary). Unset keys fall back to local-development defaults.

use crate::error::{AgentError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default Postgres coordinates, used by the `default` connection and by any
/// Postgres connection whose params leave a field out.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Overrides the individual fields when set.
    pub url: Option<String>,
}

impl DatabaseSettings {
    pub fn database_url(&self) -> String {
        self.url.clone().unwrap_or_else(|| {
            format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            )
        })
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "analytics_db".to_string(),
            user: "postgres".to_string(),
            password: "postgres_password".to_string(),
            url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: String,
    pub database: DatabaseSettings,
    pub connections_file: PathBuf,
    /// Connection the executor runs generated SQL against.
    pub query_connection: String,
    pub step_timeout: Duration,
    pub router_timeout: Duration,
    pub schema_cache_ttl: Duration,
    pub log_level: String,
    /// JSON-lines file receiving one entry per workflow run
    pub run_log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_base_url: "http://localhost:1234/v1".to_string(),
            llm_model: "local-model".to_string(),
            llm_api_key: "lm-studio".to_string(),
            database: DatabaseSettings::default(),
            connections_file: PathBuf::from("connections.json"),
            query_connection: "default".to_string(),
            step_timeout: Duration::from_secs(30),
            router_timeout: Duration::from_secs(10),
            schema_cache_ttl: Duration::from_secs(60),
            log_level: "info".to_string(),
            run_log_file: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let database = DatabaseSettings {
            host: env_or("DB_HOST", defaults.database.host),
            port: env_parse("DB_PORT", defaults.database.port)?,
            name: env_or("DB_NAME", defaults.database.name),
            user: env_or("DB_USER", defaults.database.user),
            password: env_or("DB_PASSWORD", defaults.database.password),
            url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
        };

        Ok(Self {
            llm_base_url: env_or("LLM_BASE_URL", defaults.llm_base_url),
            llm_model: env_or("LLM_MODEL_NAME", defaults.llm_model),
            llm_api_key: env_or("LLM_API_KEY", defaults.llm_api_key),
            database,
            connections_file: std::env::var("CONNECTIONS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.connections_file),
            query_connection: env_or("QUERY_CONNECTION", defaults.query_connection),
            step_timeout: Duration::from_secs(env_parse(
                "AGENT_TIMEOUT_SECONDS",
                defaults.step_timeout.as_secs(),
            )?),
            router_timeout: Duration::from_secs(env_parse(
                "ROUTER_TIMEOUT_SECONDS",
                defaults.router_timeout.as_secs(),
            )?),
            schema_cache_ttl: Duration::from_secs(env_parse(
                "SCHEMA_CACHE_TTL_SECONDS",
                defaults.schema_cache_ttl.as_secs(),
            )?),
            log_level: env_or("APP_LOG_LEVEL", defaults.log_level).to_lowercase(),
            run_log_file: std::env::var("RUN_LOG_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .map_err(|_| AgentError::Config(format!("{} must be a number, got '{}'", key, raw))),
        _ => Ok(default),
    }
}
