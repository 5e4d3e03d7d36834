use crate::security::SqlValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("{0}")]
    Validation(#[from] SqlValidationError),

    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    ConnectionConfig(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for AgentError {
    fn from(err: sqlx::Error) -> Self {
        AgentError::Backend(err.to_string())
    }
}

impl From<rusqlite::Error> for AgentError {
    fn from(err: rusqlite::Error) -> Self {
        AgentError::Backend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
