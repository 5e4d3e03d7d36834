//! Repairs a failed query. Every invocation consumes one retry.

use crate::agent_prompts::CRITIC_SYSTEM_PROMPT;
use crate::llm::GenerationRequest;
use crate::security::validate_sql;
use crate::workflow::nodes::WorkflowContext;
use crate::workflow::payload::{extract_payload, PayloadKind};
use crate::workflow::state::{StateUpdate, WorkflowState};
use tracing::{error, info};

pub async fn run(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    let retry_count = Some(state.retry_count + 1);
    let last_error = state.sql_error.clone().unwrap_or_default();
    info!("Attempting fix for error: {}", last_error);

    let request = GenerationRequest::new(CRITIC_SYSTEM_PROMPT)
        .var("question", state.question.clone())
        .var("sql_query", state.sql_query.clone().unwrap_or_default())
        .var("error", last_error)
        .var("schema", state.schema_context.clone())
        .temperature(0.0);

    let raw = match ctx.generate(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            // Error stays set so the loop keeps counting toward the bound
            error!("Critic failed: {}", e);
            return StateUpdate {
                retry_count,
                ..StateUpdate::default()
            };
        }
    };

    let fixed = extract_payload(&raw, PayloadKind::Sql);
    match validate_sql(&fixed) {
        Ok(()) => {
            info!("Critic proposed fix: {}", fixed);
            StateUpdate {
                sql_query: Some(fixed),
                sql_error: Some(None),
                retry_count,
                ..StateUpdate::default()
            }
        }
        Err(e) => {
            error!("Critic generated unsafe/invalid SQL: {}", e);
            StateUpdate {
                sql_error: Some(Some(format!("Critic failed to generate valid SQL: {}", e))),
                retry_count,
                ..StateUpdate::default()
            }
        }
    }
}
