//! Workflow Steps
//!
//! Each step reads the state and returns a `StateUpdate`; none of them
//! return errors. Provider failures and timeouts are absorbed into each
//! step's fallback.

pub mod architect;
pub mod coder;
pub mod critic;
pub mod executor;
pub mod responder;
pub mod router;
pub mod terminal;
pub mod visualizer;
pub mod viz_router;

use crate::config::Settings;
use crate::error::Result;
use crate::execution::QueryGateway;
use crate::llm::{generate_within, GenerationRequest, TextGenerator};
use crate::workflow::engine::Step;
use crate::workflow::state::{StateUpdate, WorkflowState};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub step_timeout: Duration,
    pub router_timeout: Duration,
    /// Connection the executor runs generated SQL against
    pub query_connection: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(30),
            router_timeout: Duration::from_secs(10),
            query_connection: crate::connections::DEFAULT_CONNECTION_ID.to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            step_timeout: settings.step_timeout,
            router_timeout: settings.router_timeout,
            query_connection: settings.query_connection.clone(),
        }
    }
}

/// Collaborators shared by every step of every request
#[derive(Clone)]
pub struct WorkflowContext {
    pub generator: Arc<dyn TextGenerator>,
    pub gateway: QueryGateway,
    pub config: WorkflowConfig,
}

impl WorkflowContext {
    pub fn new(generator: Arc<dyn TextGenerator>, gateway: QueryGateway, config: WorkflowConfig) -> Self {
        Self {
            generator,
            gateway,
            config,
        }
    }

    /// Generate under the regular step timeout.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        generate_within(self.generator.as_ref(), request, self.config.step_timeout).await
    }
}

pub async fn run_step(step: Step, ctx: &WorkflowContext, state: &WorkflowState) -> StateUpdate {
    match step {
        Step::Router => router::run(ctx, state).await,
        Step::Architect => architect::run(ctx, state).await,
        Step::Coder => coder::run(ctx, state).await,
        Step::Executor => executor::run(ctx, state).await,
        Step::Critic => critic::run(ctx, state).await,
        Step::VizRouter => viz_router::run(state),
        Step::Visualizer => visualizer::run(ctx, state).await,
        Step::FinalResponder => responder::final_response(ctx, state).await,
        Step::ChatResponder => responder::chat(ctx, state).await,
        Step::SchemaResponder => terminal::schema_responder(ctx).await,
        Step::Clarifier => terminal::clarifier(state),
        Step::ErrorHandler => terminal::error_handler(state),
    }
}
