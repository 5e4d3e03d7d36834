//! Model-written answers: the data summary and general chat.

use crate::agent_prompts::{CHAT_SYSTEM_PROMPT, RESPONDER_SYSTEM_PROMPT, RESPONDER_USER_MESSAGE};
use crate::llm::GenerationRequest;
use crate::workflow::nodes::WorkflowContext;
use crate::workflow::state::{StateUpdate, WorkflowState};
use tracing::{error, info};

/// Result text beyond this many characters is cut before prompting
pub const MAX_RESULT_CHARS: usize = 2000;

pub const CHAT_FALLBACK: &str = "Hi! I'm Antigravirt, a local data analysis assistant. \
Ask me a question about your data, for example \"How many orders were placed last month?\", \
or ask to see the database schema.";

pub async fn final_response(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    let request = GenerationRequest::new(RESPONDER_SYSTEM_PROMPT)
        .var("user_question", state.question.clone())
        .var("sql_query", state.sql_query.clone().unwrap_or_default())
        .var("query_result", truncate_result(&state.result_text))
        .user(RESPONDER_USER_MESSAGE)
        .temperature(0.5);

    match ctx.generate(&request).await {
        Ok(text) if !text.trim().is_empty() => StateUpdate::final_response(text),
        Ok(_) => {
            error!("Final responder returned an empty answer");
            StateUpdate::final_response(fallback_summary(state))
        }
        Err(e) => {
            error!("Final responder failed: {}", e);
            StateUpdate::final_response(fallback_summary(state))
        }
    }
}

pub async fn chat(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    let request = GenerationRequest::new(CHAT_SYSTEM_PROMPT)
        .user(state.question.clone())
        .temperature(0.7);

    match ctx.generate(&request).await {
        Ok(text) if !text.trim().is_empty() => {
            info!("Chat response received");
            StateUpdate::final_response(text)
        }
        Ok(_) => StateUpdate::final_response(CHAT_FALLBACK),
        Err(e) => {
            error!("Chat responder failed: {}", e);
            StateUpdate::final_response(CHAT_FALLBACK)
        }
    }
}

fn truncate_result(text: &str) -> String {
    if text.chars().count() <= MAX_RESULT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_RESULT_CHARS).collect();
    format!("{}... (truncated)", cut)
}

fn fallback_summary(state: &WorkflowState) -> String {
    let rows = state.query_result.len();
    match &state.draft_response {
        Some(draft) => format!(
            "{}\n\n(Row count: {}. A written summary could not be generated.)",
            draft, rows
        ),
        None => format!(
            "I found the data (Row count: {}), but couldn't generate a summary.",
            rows
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_result() {
        assert_eq!(truncate_result("short"), "short");
        let long = "x".repeat(MAX_RESULT_CHARS + 10);
        let cut = truncate_result(&long);
        assert!(cut.ends_with("... (truncated)"));
        assert_eq!(cut.chars().count(), MAX_RESULT_CHARS + "... (truncated)".len());
    }

    #[test]
    fn test_fallback_uses_draft() {
        let mut state = WorkflowState::new("q");
        state.draft_response = Some("Here are the results:\n\nn\n-\n1".to_string());
        state.query_result = vec![Default::default()];
        let text = fallback_summary(&state);
        assert!(text.starts_with("Here are the results:"));
        assert!(text.contains("Row count: 1"));
    }
}
