//! Runs the candidate query through the gateway.

use crate::execution::ToolOutput;
use crate::workflow::nodes::WorkflowContext;
use crate::workflow::state::{StateUpdate, WorkflowState};
use tracing::{error, info, warn};

pub async fn run(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    // A rejected candidate is never executed; the error stands for the critic
    if let Some(existing) = &state.sql_error {
        warn!("Skipping execution, candidate already failed: {}", existing);
        return StateUpdate::default();
    }

    let sql = match state.sql_query.as_deref().map(str::trim) {
        Some(sql) if !sql.is_empty() => sql,
        _ => {
            error!("No SQL query found in state");
            return StateUpdate {
                sql_error: Some(Some("No SQL generated".to_string())),
                ..StateUpdate::default()
            };
        }
    };

    let output = ctx.gateway.run_query(&ctx.config.query_connection, sql).await;
    let text = output.render();

    match output {
        ToolOutput::Failure { .. } => {
            error!("Query execution failed: {}", text);
            StateUpdate {
                sql_error: Some(Some(text)),
                ..StateUpdate::default()
            }
        }
        ToolOutput::Table(_) | ToolOutput::Empty => {
            info!("Query executed successfully");
            StateUpdate {
                query_result: Some(output.records()),
                draft_response: Some(format!("Here are the results:\n\n{}", text)),
                result_text: Some(text),
                sql_error: Some(None),
                ..StateUpdate::default()
            }
        }
    }
}
