//! SQL generation.

use crate::agent_prompts::CODER_SYSTEM_PROMPT;
use crate::llm::GenerationRequest;
use crate::security::validate_sql;
use crate::workflow::nodes::WorkflowContext;
use crate::workflow::payload::{extract_payload, PayloadKind};
use crate::workflow::state::{StateUpdate, WorkflowState};
use tracing::{error, info};

pub async fn run(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    let request = GenerationRequest::new(CODER_SYSTEM_PROMPT)
        .var("schema", state.schema_context.clone())
        .var("question", state.question.clone())
        .temperature(0.0);

    let raw = match ctx.generate(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Coder failed: {}", e);
            return StateUpdate {
                sql_error: Some(Some(e.to_string())),
                ..StateUpdate::default()
            };
        }
    };

    let sql = extract_payload(&raw, PayloadKind::Sql);
    match validate_sql(&sql) {
        Ok(()) => {
            info!("Generated SQL: {}", sql);
            StateUpdate {
                sql_query: Some(sql),
                sql_error: Some(None),
                ..StateUpdate::default()
            }
        }
        Err(e) => {
            error!("Generated unsafe/invalid SQL: {}", e);
            StateUpdate {
                sql_query: Some(sql),
                sql_error: Some(Some(e.to_string())),
                ..StateUpdate::default()
            }
        }
    }
}
