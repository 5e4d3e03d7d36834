//! Decides whether a successful result deserves a chart. No model call.

use crate::workflow::state::{StateUpdate, WorkflowState};
use tracing::info;

const VIZ_KEYWORDS: [&str; 10] = [
    "chart",
    "plot",
    "graph",
    "visualize",
    "visualization",
    "trend",
    "distribution",
    "bar",
    "line",
    "pie",
];

const COMPARISON_PHRASES: [&str; 3] = ["over time", "by month", "compare"];

pub fn run(state: &WorkflowState) -> StateUpdate {
    let needs = needs_visualization(&state.question, &state.result_text);
    info!("Needs visualization: {}", needs);
    StateUpdate {
        needs_visualization: Some(needs),
        ..StateUpdate::default()
    }
}

pub fn needs_visualization(question: &str, result_text: &str) -> bool {
    let question = question.to_lowercase();
    let explicit = VIZ_KEYWORDS.iter().any(|k| question.contains(k));
    let comparison = COMPARISON_PHRASES.iter().any(|p| question.contains(p));
    has_tabular_data(result_text) && (explicit || comparison)
}

/// A rendered table with a separator line and at least two data rows
fn has_tabular_data(text: &str) -> bool {
    if !text.contains('|') {
        return false;
    }
    let lines: Vec<&str> = text.trim().lines().collect();
    let has_separator = lines.iter().any(|line| {
        let line = line.trim();
        line.contains('-') && line.chars().all(|c| c == '-' || c == '|')
    });
    has_separator && lines.len() > 3
}
