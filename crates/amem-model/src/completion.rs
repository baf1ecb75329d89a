//! Blocking client for OpenAI-compatible chat completion APIs.
//!
//! Works against ModelScope, vLLM, LM Studio, Ollama's `/v1` endpoint and
//! anything else that speaks `POST {base_url}/chat/completions`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::CompletionConfig;
use crate::error::{ModelError, ModelResult};
use crate::{CompletionModel, CompletionRequest};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion model behind an OpenAI-compatible HTTP API.
pub struct OpenAiCompletionModel {
    config: CompletionConfig,
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for OpenAiCompletionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompletionModel")
            .field("endpoint", &self.endpoint)
            .field("model", &self.config.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl OpenAiCompletionModel {
    /// Build a client from configuration.
    ///
    /// A missing API key is not an error; local servers usually need none.
    pub fn new(config: &CompletionConfig) -> ModelResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::ProviderNotAvailable {
                provider: "openai".to_string(),
                reason: e.to_string(),
            })?;

        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            debug!(
                "No API key in config or ${}; sending unauthenticated requests",
                config.api_key_env
            );
        }

        Ok(Self {
            endpoint: config.endpoint(),
            api_key,
            config: config.clone(),
            client,
        })
    }

    /// Request body for `request`.
    ///
    /// `extra_body` fields go in first so they can never override the
    /// model, messages or sampling settings.
    fn build_body(&self, request: &CompletionRequest) -> ModelResult<Value> {
        let mut body: Map<String, Value> = self.config.extra_body.clone();

        let system = request
            .system_role
            .as_deref()
            .or(self.config.default_system_prompt.as_deref());

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let temperature = if request.structured {
            self.config.structured_temperature
        } else {
            self.config.temperature
        };

        body.insert("model".to_string(), Value::String(self.config.model.clone()));
        body.insert("messages".to_string(), serde_json::to_value(&messages)?);
        body.insert("temperature".to_string(), serde_json::to_value(temperature)?);
        if let Some(max_tokens) = self.config.max_tokens {
            body.insert("max_tokens".to_string(), Value::from(max_tokens));
        }
        if request.structured && self.config.json_response_format {
            body.insert(
                "response_format".to_string(),
                serde_json::json!({ "type": "json_object" }),
            );
        }

        Ok(Value::Object(body))
    }

    fn extract_content(&self, response: ChatResponse) -> ModelResult<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::EmptyCompletion {
                model_id: self.config.model.clone(),
            })
    }
}

impl CompletionModel for OpenAiCompletionModel {
    fn complete(&self, request: &CompletionRequest) -> ModelResult<String> {
        let body = self.build_body(request)?;
        trace!("POST {} structured={}", self.endpoint, request.structured);

        let mut http = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http
            .send()
            .map_err(|e| ModelError::completion_request(&self.endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::CompletionStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ModelError::completion_request(&self.endpoint, e.to_string()))?;
        let content = self.extract_content(parsed)?;
        debug!("Completion returned {} chars", content.len());
        Ok(content)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}
