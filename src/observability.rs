//! Execution Logger
//!
//! Records one entry per completed workflow run: kept in a bounded in-memory
//! list and optionally appended to a JSON-lines file.

use crate::error::Result;
use crate::workflow::state::WorkflowState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub intent: String,
    pub intent_confidence: f64,
    pub sql_generated: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub retries: u32,
    pub rows_returned: usize,
    pub terminal_step: String,
    pub execution_time_ms: u64,
}

impl QueryLogEntry {
    pub fn from_run(state: &WorkflowState, terminal_step: &str, success: bool, elapsed: Duration) -> Self {
        Self {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            question: state.question.clone(),
            intent: state.intent.as_str().to_string(),
            intent_confidence: state.intent_confidence,
            sql_generated: state.sql_query.clone(),
            success,
            error_message: state.sql_error.clone(),
            retries: state.retry_count,
            rows_returned: state.query_result.len(),
            terminal_step: terminal_step.to_string(),
            execution_time_ms: elapsed.as_millis() as u64,
        }
    }
}

pub struct ExecutionLogger {
    log_file: Option<PathBuf>,
    query_logs: Mutex<VecDeque<QueryLogEntry>>,
    max_in_memory_logs: usize,
}

impl ExecutionLogger {
    pub fn new(log_file: Option<PathBuf>, max_in_memory_logs: usize) -> Self {
        Self {
            log_file,
            query_logs: Mutex::new(VecDeque::new()),
            max_in_memory_logs,
        }
    }

    pub async fn log_query(&self, entry: QueryLogEntry) -> Result<()> {
        let line = match &self.log_file {
            Some(_) => Some(format!("{}\n", serde_json::to_string(&entry)?)),
            None => None,
        };

        {
            let mut logs = self.query_logs.lock().unwrap_or_else(|e| e.into_inner());
            logs.push_back(entry);
            while logs.len() > self.max_in_memory_logs {
                logs.pop_front();
            }
        }

        if let (Some(path), Some(line)) = (&self.log_file, line) {
            let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }
        Ok(())
    }

    /// Most recent entries, newest last
    pub fn recent(&self, limit: usize) -> Vec<QueryLogEntry> {
        let logs = self.query_logs.lock().unwrap_or_else(|e| e.into_inner());
        let start = logs.len().saturating_sub(limit);
        logs.iter().skip(start).cloned().collect()
    }
}
