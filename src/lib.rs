pub mod agent_prompts;
pub mod config;
pub mod connections;
pub mod error;
pub mod execution;
pub mod llm;
pub mod observability;
pub mod security;
pub mod workflow;

pub use config::Settings;
pub use connections::{ConnectionEntry, ConnectionRegistry, ConnectionType, ToolCall, ToolResult};
pub use error::{AgentError, Result};
pub use execution::{BackendAdapter, QueryGateway, ToolOutput};
pub use llm::{GenerationRequest, LlmClient, TextGenerator};
pub use observability::ExecutionLogger;
pub use workflow::{StepEvent, WorkflowConfig, WorkflowContext, WorkflowEngine, WorkflowState};
