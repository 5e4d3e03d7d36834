//! Chart specification generation.

use crate::agent_prompts::VISUALIZER_SYSTEM_PROMPT;
use crate::llm::GenerationRequest;
use crate::workflow::nodes::WorkflowContext;
use crate::workflow::payload::{extract_payload, PayloadKind};
use crate::workflow::state::{StateUpdate, WorkflowState};
use serde_json::Value;
use tracing::{error, info, warn};

pub async fn run(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    let no_chart = StateUpdate {
        visualization_code: Some(None),
        ..StateUpdate::default()
    };

    if state.result_text.is_empty() {
        return no_chart;
    }

    let request = GenerationRequest::new(VISUALIZER_SYSTEM_PROMPT)
        .var("data_context", state.result_text.clone())
        .var("question", state.question.clone())
        .temperature(0.0);

    let raw = match ctx.generate(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Visualizer failed: {}", e);
            return no_chart;
        }
    };

    match parse_chart(&raw) {
        Some(chart) => {
            info!("Generated visualization config");
            StateUpdate {
                visualization_code: Some(Some(chart)),
                ..StateUpdate::default()
            }
        }
        None => {
            warn!("Visualizer output is not a chart spec with a data key");
            no_chart
        }
    }
}

/// Compact JSON of a chart object that carries a `data` key
fn parse_chart(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(&extract_payload(raw, PayloadKind::Json)).ok()?;
    match &value {
        Value::Object(map) if map.contains_key("data") => Some(value.to_string()),
        _ => None,
    }
}
