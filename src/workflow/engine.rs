//! Workflow Engine
//!
//! An explicit state machine: `transition` picks the next step from the
//! current one and the merged state, and the engine loop runs steps until
//! a terminal step has produced the final response.
//!
//! ```text
//! router ─(confidence<0.7)→ clarifier
//! router ─(DATA_QUERY)→ architect → coder → executor
//! router ─(SCHEMA_QUESTION)→ schema_responder
//! router ─(GENERAL_CHAT)→ chat_responder
//! executor ─(ok)→ viz_router ─→ [visualizer →] final_responder
//! executor ─(error, retries<3)→ critic → executor
//! executor ─(error, retries≥3)→ error_handler
//! ```

use crate::observability::{ExecutionLogger, QueryLogEntry};
use crate::workflow::nodes::router::CONFIDENCE_THRESHOLD;
use crate::workflow::nodes::{run_step, WorkflowContext};
use crate::workflow::state::{Intent, StateUpdate, WorkflowState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Critic invocations allowed before the error handler takes over
pub const MAX_CRITIC_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Router,
    Architect,
    Coder,
    Executor,
    Critic,
    VizRouter,
    Visualizer,
    FinalResponder,
    SchemaResponder,
    ChatResponder,
    Clarifier,
    ErrorHandler,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Router => "router",
            Step::Architect => "architect",
            Step::Coder => "coder",
            Step::Executor => "executor",
            Step::Critic => "critic",
            Step::VizRouter => "viz_router",
            Step::Visualizer => "visualizer",
            Step::FinalResponder => "final_responder",
            Step::SchemaResponder => "schema_responder",
            Step::ChatResponder => "chat_responder",
            Step::Clarifier => "clarifier",
            Step::ErrorHandler => "error_handler",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Step::FinalResponder
                | Step::SchemaResponder
                | Step::ChatResponder
                | Step::Clarifier
                | Step::ErrorHandler
        )
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Next step after `step` completed, or `None` once a terminal step ran.
pub fn transition(step: Step, state: &WorkflowState) -> Option<Step> {
    match step {
        Step::Router => Some(if state.intent_confidence < CONFIDENCE_THRESHOLD {
            Step::Clarifier
        } else {
            match state.intent {
                Intent::DataQuery => Step::Architect,
                Intent::SchemaQuestion => Step::SchemaResponder,
                Intent::GeneralChat => Step::ChatResponder,
                Intent::Ambiguous => Step::Clarifier,
            }
        }),
        Step::Architect => Some(Step::Coder),
        Step::Coder => Some(Step::Executor),
        Step::Executor => Some(match &state.sql_error {
            None => Step::VizRouter,
            Some(_) if state.retry_count < MAX_CRITIC_RETRIES => Step::Critic,
            Some(_) => Step::ErrorHandler,
        }),
        Step::Critic => Some(Step::Executor),
        Step::VizRouter => Some(if state.needs_visualization {
            Step::Visualizer
        } else {
            Step::FinalResponder
        }),
        Step::Visualizer => Some(Step::FinalResponder),
        Step::FinalResponder
        | Step::SchemaResponder
        | Step::ChatResponder
        | Step::Clarifier
        | Step::ErrorHandler => None,
    }
}

/// Progress notification emitted after each completed step
#[derive(Debug, Clone, Serialize)]
pub struct StepEvent {
    pub step: Step,
    pub update: StateUpdate,
    pub at: DateTime<Utc>,
}

pub struct WorkflowEngine {
    ctx: WorkflowContext,
    logger: Option<Arc<ExecutionLogger>>,
}

impl WorkflowEngine {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx, logger: None }
    }

    pub fn with_logger(mut self, logger: Arc<ExecutionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    pub async fn run(&self, question: &str) -> WorkflowState {
        self.drive(question, None).await
    }

    /// Like [`run`](Self::run), also sending a `StepEvent` per step. A closed
    /// receiver does not interrupt the run.
    pub async fn run_streaming(&self, question: &str, events: UnboundedSender<StepEvent>) -> WorkflowState {
        self.drive(question, Some(&events)).await
    }

    async fn drive(&self, question: &str, events: Option<&UnboundedSender<StepEvent>>) -> WorkflowState {
        let started = Instant::now();
        let mut state = WorkflowState::new(question);
        let mut step = Step::Router;
        info!("Workflow started: {}", question);

        loop {
            debug!("--- {} ---", step);
            let update = run_step(step, &self.ctx, &state).await;

            if let Some(tx) = events {
                let event = StepEvent {
                    step,
                    update: update.clone(),
                    at: Utc::now(),
                };
                if tx.send(event).is_err() {
                    debug!("Step event receiver dropped");
                }
            }
            state.apply(update);
            info!("Step completed: {}", step);

            match transition(step, &state) {
                Some(next) => step = next,
                None => break,
            }
        }

        let elapsed = started.elapsed();
        info!("Workflow finished at {} in {:?}", step, elapsed);

        if let Some(logger) = &self.logger {
            let entry = QueryLogEntry::from_run(&state, step.name(), step != Step::ErrorHandler, elapsed);
            if let Err(e) = logger.log_query(entry).await {
                warn!("Failed to write run log: {}", e);
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routed(intent: Intent, confidence: f64) -> Option<Step> {
        let mut state = WorkflowState::new("q");
        state.intent = intent;
        state.intent_confidence = confidence;
        transition(Step::Router, &state)
    }

    #[test]
    fn test_router_transitions() {
        assert_eq!(routed(Intent::DataQuery, 0.9), Some(Step::Architect));
        assert_eq!(routed(Intent::SchemaQuestion, 0.7), Some(Step::SchemaResponder));
        assert_eq!(routed(Intent::GeneralChat, 0.99), Some(Step::ChatResponder));
        assert_eq!(routed(Intent::Ambiguous, 0.99), Some(Step::Clarifier));
        // Low confidence wins over any label
        assert_eq!(routed(Intent::DataQuery, 0.69), Some(Step::Clarifier));
    }

    #[test]
    fn test_executor_retry_bound() {
        let mut state = WorkflowState::new("q");
        assert_eq!(transition(Step::Executor, &state), Some(Step::VizRouter));

        state.sql_error = Some("Database Error: boom".to_string());
        for retries in 0..MAX_CRITIC_RETRIES {
            state.retry_count = retries;
            assert_eq!(transition(Step::Executor, &state), Some(Step::Critic));
        }
        state.retry_count = MAX_CRITIC_RETRIES;
        assert_eq!(transition(Step::Executor, &state), Some(Step::ErrorHandler));
    }

    #[test]
    fn test_terminal_steps_end_the_run() {
        let state = WorkflowState::new("q");
        for step in [
            Step::FinalResponder,
            Step::SchemaResponder,
            Step::ChatResponder,
            Step::Clarifier,
            Step::ErrorHandler,
        ] {
            assert!(step.is_terminal());
            assert_eq!(transition(step, &state), None);
        }
    }

    #[test]
    fn test_viz_branch() {
        let mut state = WorkflowState::new("q");
        assert_eq!(transition(Step::VizRouter, &state), Some(Step::FinalResponder));
        state.needs_visualization = true;
        assert_eq!(transition(Step::VizRouter, &state), Some(Step::Visualizer));
        assert_eq!(transition(Step::Visualizer, &state), Some(Step::FinalResponder));
    }
}
