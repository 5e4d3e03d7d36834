//! Templated terminal steps.

use crate::workflow::nodes::WorkflowContext;
use crate::workflow::state::{StateUpdate, WorkflowState};
use tracing::info;

pub async fn schema_responder(ctx: &WorkflowContext) -> StateUpdate {
    let schema = ctx.gateway.get_schema(None).await;
    StateUpdate::final_response(format!("Here is the current database schema:\n\n{}\n", schema))
}

pub fn clarifier(state: &WorkflowState) -> StateUpdate {
    info!("Asking for clarification");
    StateUpdate::final_response(format!(
        "I'm not quite sure I understood your request: \"{}\"\n\n\
         Could you please rephrase it?\n\
         - If you want to query data, try asking a specific question like \"How many orders?\"\n\
         - If you want to know about the database, ask \"Show schema\".\n",
        state.question
    ))
}

pub fn error_handler(state: &WorkflowState) -> StateUpdate {
    let error = state.sql_error.as_deref().unwrap_or("Unknown error");
    StateUpdate::final_response(format!(
        "I apologize, but I was unable to process your request after multiple attempts.\n\n\
         **Original Question:** {}\n\
         **Error Encountered:** {}\n\n\
         Please try rephrasing your question or checking if the data you are looking for exists in the database.\n",
        state.question, error
    ))
}
