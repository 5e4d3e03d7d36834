//! Table selection: narrows the schema handed to the coder.

use crate::agent_prompts::ARCHITECT_SYSTEM_PROMPT;
use crate::error::{AgentError, Result};
use crate::llm::GenerationRequest;
use crate::workflow::nodes::WorkflowContext;
use crate::workflow::payload::{extract_payload, PayloadKind};
use crate::workflow::state::{StateUpdate, WorkflowState};
use serde_json::Value;
use tracing::{error, info, warn};

pub async fn run(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    let full_schema = ctx.gateway.get_schema(None).await;

    let request = GenerationRequest::new(ARCHITECT_SYSTEM_PROMPT)
        .var("schema", full_schema.clone())
        .user(state.question.clone())
        .temperature(0.0);

    let tables = match ctx.generate(&request).await.and_then(|raw| parse_table_list(&raw)) {
        Ok(tables) => tables,
        Err(e) => {
            error!("Architect failed: {}", e);
            return fallback(full_schema);
        }
    };
    info!("Identified tables: {:?}", tables);

    if tables.is_empty() {
        return fallback(full_schema);
    }

    let focused = ctx.gateway.get_schema(Some(&tables)).await;
    StateUpdate {
        relevant_tables: Some(tables),
        schema_context: Some(focused),
        ..StateUpdate::default()
    }
}

fn fallback(full_schema: String) -> StateUpdate {
    StateUpdate {
        relevant_tables: Some(Vec::new()),
        schema_context: Some(full_schema),
        ..StateUpdate::default()
    }
}

/// A JSON list of table names. A non-list answer counts as "no tables".
fn parse_table_list(raw: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(&extract_payload(raw, PayloadKind::Json))
        .map_err(|e| AgentError::Llm(format!("Architect returned invalid JSON: {}", e)))?;
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()),
        _ => {
            warn!("Architect didn't return a list, falling back to full schema");
            Ok(Vec::new())
        }
    }
}
