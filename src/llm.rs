//! Text-Generation Port
//!
//! Workflow steps depend on `TextGenerator` only. `LlmClient` implements it
//! against any OpenAI-compatible `/chat/completions` endpoint (LM Studio by
//! default); tests substitute scripted generators.

use crate::config::Settings;
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([a-z_]+)\}").unwrap();
}

/// One generation call: a system prompt template, the values for its
/// `{name}` placeholders, an optional user turn and a sampling temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub variables: BTreeMap<String, String>,
    pub user_message: Option<String>,
    pub temperature: f64,
}

impl GenerationRequest {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            variables: BTreeMap::new(),
            user_message: None,
            temperature: 0.0,
        }
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.variables.insert(key.to_string(), value.into());
        self
    }

    pub fn user(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// System prompt with placeholders filled in. Unknown placeholders are
    /// left untouched.
    pub fn render_system_prompt(&self) -> String {
        PLACEHOLDER
            .replace_all(&self.system_prompt, |caps: &Captures| {
                self.variables
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Run a generation under a deadline; expiry is an ordinary error.
pub async fn generate_within(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<String> {
    tokio::time::timeout(timeout, generator.generate(request))
        .await
        .map_err(|_| AgentError::Timeout(timeout.as_secs()))?
}

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        info!(
            "LLM config - base URL: {}, model: {}",
            settings.llm_base_url, settings.llm_model
        );
        Self::new(
            settings.llm_base_url.clone(),
            settings.llm_model.clone(),
            settings.llm_api_key.clone(),
        )
    }

    fn request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.render_system_prompt(),
        })];
        if let Some(user) = &request.user_message {
            messages.push(serde_json::json!({"role": "user", "content": user}));
        }
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = self.request_body(request);
        debug!("LLM request to {} (temperature {})", self.base_url, request.temperature);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!("LLM API returned {}: {}", status, text)));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AgentError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AgentError::Llm("No content in LLM response".to_string()))?;

        Ok(content.trim().to_string())
    }
}
