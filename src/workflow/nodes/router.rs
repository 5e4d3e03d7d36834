//! Intent classification.

use crate::agent_prompts::ROUTER_SYSTEM_PROMPT;
use crate::error::{AgentError, Result};
use crate::llm::{generate_within, GenerationRequest};
use crate::workflow::nodes::WorkflowContext;
use crate::workflow::payload::{extract_payload, PayloadKind};
use crate::workflow::state::{Intent, StateUpdate, WorkflowState};
use serde_json::Value;
use tracing::{error, info};

/// Below this confidence the question always goes to the clarifier
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

pub async fn run(ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    let request = GenerationRequest::new(ROUTER_SYSTEM_PROMPT)
        .user(state.question.clone())
        .temperature(0.0);

    let classified = generate_within(ctx.generator.as_ref(), &request, ctx.config.router_timeout)
        .await
        .and_then(|raw| {
            info!("Raw router response: {}", raw);
            parse_classification(&raw)
        });

    let (intent, confidence) = match classified {
        Ok(pair) => pair,
        Err(e) => {
            error!("Router failed: {}", e);
            (Intent::GeneralChat, 0.0)
        }
    };
    info!("Classified intent: {} ({})", intent.as_str(), confidence);

    StateUpdate {
        intent: Some(intent),
        intent_confidence: Some(confidence),
        ..StateUpdate::default()
    }
}

/// `{"intent": ..., "confidence": ...}` with a missing intent meaning
/// AMBIGUOUS and a missing confidence meaning 0.
fn parse_classification(raw: &str) -> Result<(Intent, f64)> {
    let value: Value = serde_json::from_str(&extract_payload(raw, PayloadKind::Json))?;
    if !value.is_object() {
        return Err(AgentError::Llm("Router response is not a JSON object".to_string()));
    }

    let intent = value
        .get("intent")
        .and_then(Value::as_str)
        .map(Intent::from_label)
        .unwrap_or(Intent::Ambiguous);

    let confidence = match value.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    let confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };

    Ok((intent, confidence))
}
