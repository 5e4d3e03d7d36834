#![allow(dead_code)]

use antigravirt::agent_prompts::{
    ARCHITECT_SYSTEM_PROMPT, CHAT_SYSTEM_PROMPT, CODER_SYSTEM_PROMPT, CRITIC_SYSTEM_PROMPT,
    RESPONDER_SYSTEM_PROMPT, ROUTER_SYSTEM_PROMPT, VISUALIZER_SYSTEM_PROMPT,
};
use antigravirt::config::DatabaseSettings;
use antigravirt::connections::{ConnectionEntry, ConnectionRegistry, ConnectionType};
use antigravirt::error::{AgentError, Result};
use antigravirt::execution::{BackendAdapter, QueryGateway, QueryRows};
use antigravirt::llm::{GenerationRequest, TextGenerator};
use antigravirt::workflow::{WorkflowConfig, WorkflowContext, WorkflowEngine};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    Router,
    Architect,
    Coder,
    Critic,
    Visualizer,
    Responder,
    Chat,
    Other,
}

impl Prompt {
    pub fn of(request: &GenerationRequest) -> Self {
        match request.system_prompt.as_str() {
            p if p == ROUTER_SYSTEM_PROMPT => Prompt::Router,
            p if p == ARCHITECT_SYSTEM_PROMPT => Prompt::Architect,
            p if p == CODER_SYSTEM_PROMPT => Prompt::Coder,
            p if p == CRITIC_SYSTEM_PROMPT => Prompt::Critic,
            p if p == VISUALIZER_SYSTEM_PROMPT => Prompt::Visualizer,
            p if p == RESPONDER_SYSTEM_PROMPT => Prompt::Responder,
            p if p == CHAT_SYSTEM_PROMPT => Prompt::Chat,
            _ => Prompt::Other,
        }
    }
}

/// Answers each step with a fixed reply; unscripted steps fail.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: HashMap<Prompt, String>,
    calls: Mutex<Vec<Prompt>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, prompt: Prompt, text: &str) -> Self {
        self.replies.insert(prompt, text.to_string());
        self
    }

    pub fn calls_to(&self, prompt: Prompt) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| **p == prompt).count()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let prompt = Prompt::of(request);
        self.calls.lock().unwrap().push(prompt);
        self.replies
            .get(&prompt)
            .cloned()
            .ok_or_else(|| AgentError::Llm(format!("no scripted reply for {:?}", prompt)))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(AgentError::Llm("provider unavailable".to_string()))
    }
}

pub struct HangingGenerator;

#[async_trait]
impl TextGenerator for HangingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        std::future::pending::<()>().await;
        Ok(String::new())
    }
}

type QueryFn = dyn Fn(&str) -> Result<QueryRows> + Send + Sync;

/// In-memory backend with scripted query results and call counters
pub struct FakeBackend {
    schema: std::result::Result<String, String>,
    on_query: Box<QueryFn>,
    pub query_calls: AtomicUsize,
    pub schema_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(schema: &str, on_query: impl Fn(&str) -> Result<QueryRows> + Send + Sync + 'static) -> Self {
        Self {
            schema: Ok(schema.to_string()),
            on_query: Box::new(on_query),
            query_calls: AtomicUsize::new(0),
            schema_calls: AtomicUsize::new(0),
        }
    }

    pub fn broken_schema(message: &str) -> Self {
        Self {
            schema: Err(message.to_string()),
            on_query: Box::new(|_| Err(AgentError::Backend("unreachable".to_string()))),
            query_calls: AtomicUsize::new(0),
            schema_calls: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn schema_reads(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendAdapter for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn query(&self, sql: &str) -> Result<QueryRows> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        (self.on_query)(sql)
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(vec!["customers".to_string(), "orders".to_string()])
    }

    async fn get_schema(&self, _table_filter: Option<&[String]>) -> Result<String> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.schema.clone().map_err(AgentError::Backend)
    }
}

pub const CUSTOMERS_SCHEMA: &str = "Table: customers\n-----------------\n- id (integer)\n- name (text)";

pub fn rows(columns: &[&str], data: &[&[&str]]) -> QueryRows {
    QueryRows::new(
        columns.iter().map(|c| c.to_string()).collect(),
        data.iter()
            .map(|r| r.iter().map(|v| v.to_string()).collect())
            .collect(),
    )
}

pub fn empty_registry() -> Arc<ConnectionRegistry> {
    Arc::new(ConnectionRegistry::new(
        DatabaseSettings::default(),
        Duration::from_secs(60),
    ))
}

/// Registry whose `default` connection is served by `backend`
pub fn registry_with(backend: Arc<FakeBackend>) -> Arc<ConnectionRegistry> {
    let registry = empty_registry();
    registry
        .add_with_adapter(
            ConnectionEntry::new("default", ConnectionType::Postgres, "Default Database"),
            backend,
        )
        .unwrap();
    registry
}

pub fn engine(generator: Arc<dyn TextGenerator>, registry: Arc<ConnectionRegistry>) -> WorkflowEngine {
    let config = WorkflowConfig::default();
    let gateway = QueryGateway::new(registry, config.step_timeout);
    WorkflowEngine::new(WorkflowContext::new(generator, gateway, config))
}
