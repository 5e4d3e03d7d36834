//! Agentic workflow: state, steps and the state-machine engine.

pub mod engine;
pub mod nodes;
pub mod payload;
pub mod state;

pub use engine::{transition, Step, StepEvent, WorkflowEngine, MAX_CRITIC_RETRIES};
pub use nodes::{WorkflowConfig, WorkflowContext};
pub use payload::{extract_payload, PayloadKind};
pub use state::{Intent, StateUpdate, WorkflowState};
