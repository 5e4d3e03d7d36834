//! Workflow State
//!
//! One `WorkflowState` exists per request. Steps never mutate it directly:
//! each returns a `StateUpdate` and the engine merges it, later writes
//! overwriting earlier ones.

use crate::execution::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    DataQuery,
    SchemaQuestion,
    GeneralChat,
    #[default]
    Ambiguous,
}

impl Intent {
    /// Parse a classifier label; anything unrecognised is `Ambiguous`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "DATA_QUERY" => Intent::DataQuery,
            "SCHEMA_QUESTION" => Intent::SchemaQuestion,
            "GENERAL_CHAT" => Intent::GeneralChat,
            _ => Intent::Ambiguous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::DataQuery => "DATA_QUERY",
            Intent::SchemaQuestion => "SCHEMA_QUESTION",
            Intent::GeneralChat => "GENERAL_CHAT",
            Intent::Ambiguous => "AMBIGUOUS",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowState {
    pub question: String,
    pub intent: Intent,
    pub intent_confidence: f64,
    pub relevant_tables: Vec<String>,
    pub schema_context: String,
    pub sql_query: Option<String>,
    pub sql_error: Option<String>,
    /// Critic invocations so far; the only loop-termination signal
    pub retry_count: u32,
    pub query_result: Vec<Row>,
    /// Rendered table text of the successful result
    pub result_text: String,
    /// Templated answer produced by the executor, used as a fallback
    pub draft_response: Option<String>,
    pub needs_visualization: bool,
    pub visualization_code: Option<String>,
    pub final_response: Option<String>,
}

impl WorkflowState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// Merge a step's update into the state.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(intent) = update.intent {
            self.intent = intent;
        }
        if let Some(confidence) = update.intent_confidence {
            self.intent_confidence = confidence;
        }
        if let Some(tables) = update.relevant_tables {
            self.relevant_tables = tables;
        }
        if let Some(schema) = update.schema_context {
            self.schema_context = schema;
        }
        if let Some(sql) = update.sql_query {
            self.sql_query = Some(sql);
        }
        if let Some(error) = update.sql_error {
            self.sql_error = error;
        }
        if let Some(retries) = update.retry_count {
            self.retry_count = retries;
        }
        if let Some(rows) = update.query_result {
            self.query_result = rows;
        }
        if let Some(text) = update.result_text {
            self.result_text = text;
        }
        if let Some(draft) = update.draft_response {
            self.draft_response = Some(draft);
        }
        if let Some(needs) = update.needs_visualization {
            self.needs_visualization = needs;
        }
        if let Some(code) = update.visualization_code {
            self.visualization_code = code;
        }
        if let Some(response) = update.final_response {
            self.final_response = Some(response);
        }
    }
}

/// Partial write produced by one step. `None` leaves a field alone; for the
/// nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_tables: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_error: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_result: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_visualization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_code: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
}

impl StateUpdate {
    pub fn final_response(text: impl Into<String>) -> Self {
        Self {
            final_response: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
