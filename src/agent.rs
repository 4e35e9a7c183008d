//! LLM agent module for digest summarization.
//!
//! Talks to each provider's chat API directly over reqwest. The API key is
//! handed to the client when it is built and never read from process state.

use crate::config::{Credential, EndpointConfig};
use crate::prompt::Prompt;
use crate::provider::Provider;
use crate::search::USER_AGENT;
use crate::summary::Summary;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

/// Anthropic requires an explicit output budget
const ANTHROPIC_MAX_TOKENS: u32 = 1024;
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("invalid model name: '{0}'")]
    InvalidModel(String),
    #[error("LLM request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: Provider,
        status: StatusCode,
        body: String,
    },
    #[error("failed to parse response: {0}")]
    MalformedResponse(String),
    #[error("invalid endpoint URL '{0}'")]
    InvalidEndpoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One turn of a chat request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

/// The text a model produced for a chat request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
}

/// A chat-capable model bound to a provider, model name, and credential.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, AgentError>;
}

/// Turns a provider and model name into a ready-to-call [`ChatModel`].
pub trait ModelResolver: Send + Sync {
    fn resolve(
        &self,
        provider: Provider,
        model_name: &str,
        credential: &Credential,
    ) -> Result<Box<dyn ChatModel>, AgentError>;
}

/// Resolve the model and send the prompt as a system turn followed by a user
/// turn. The response text is returned as-is.
pub async fn summarize<R>(
    resolver: &R,
    prompt: &Prompt,
    provider: Provider,
    model_name: &str,
    credential: &Credential,
) -> Result<Summary, AgentError>
where
    R: ModelResolver + ?Sized,
{
    let model = resolver.resolve(provider, model_name, credential)?;
    info!(provider = %provider, model = model_name, "Model resolved");

    let messages = [
        ChatMessage::system(prompt.system_instruction.as_str()),
        ChatMessage::user(prompt.user_content.as_str()),
    ];
    let response = model.invoke(&messages).await?;

    Ok(Summary::new(response.content))
}

/// Builds HTTP clients for the configured provider endpoints
#[derive(Debug, Clone, Default)]
pub struct HttpModelResolver {
    endpoints: EndpointConfig,
}

impl HttpModelResolver {
    pub fn new(endpoints: EndpointConfig) -> Self {
        Self { endpoints }
    }
}

impl ModelResolver for HttpModelResolver {
    fn resolve(
        &self,
        provider: Provider,
        model_name: &str,
        credential: &Credential,
    ) -> Result<Box<dyn ChatModel>, AgentError> {
        let model = model_name.trim();
        if model.is_empty() {
            return Err(AgentError::InvalidModel(model_name.to_string()));
        }

        let endpoint = HttpEndpoint {
            client: Client::builder().user_agent(USER_AGENT).build()?,
            base_url: self
                .endpoints
                .for_provider(provider)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            credential: credential.clone(),
            provider,
        };

        let model: Box<dyn ChatModel> = match provider {
            Provider::OpenAi | Provider::Mistral => Box::new(ChatCompletionsModel(endpoint)),
            Provider::Anthropic => Box::new(AnthropicModel(endpoint)),
            Provider::Gemini => Box::new(GeminiModel(endpoint)),
        };
        Ok(model)
    }
}

/// Connection details shared by every provider client
struct HttpEndpoint {
    client: Client,
    base_url: String,
    model: String,
    credential: Credential,
    provider: Provider,
}

impl HttpEndpoint {
    async fn send(&self, request: RequestBuilder) -> Result<Value, AgentError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                provider: self.provider,
                status,
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AgentError::MalformedResponse(e.to_string()))
    }

    /// Base URL with `segments` appended, each percent-encoded as one path segment
    fn url_with_segments(&self, segments: &[&str]) -> Result<Url, AgentError> {
        let invalid = || AgentError::InvalidEndpoint(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn split_system(messages: &[ChatMessage]) -> (String, Vec<&ChatMessage>) {
    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let turns = messages.iter().filter(|m| m.role != Role::System).collect();
    (system, turns)
}

/// OpenAI-style `/v1/chat/completions` (OpenAI and Mistral)
struct ChatCompletionsModel(HttpEndpoint);

#[async_trait]
impl ChatModel for ChatCompletionsModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, AgentError> {
        let endpoint = &self.0;
        let url = format!("{}/v1/chat/completions", endpoint.base_url);
        debug!(%url, model = %endpoint.model, "Chat completion request");

        let payload = json!({
            "model": endpoint.model,
            "messages": messages
                .iter()
                .map(|m| json!({"role": m.role, "content": m.text}))
                .collect::<Vec<_>>(),
        });

        let request = endpoint
            .client
            .post(&url)
            .bearer_auth(endpoint.credential.expose())
            .json(&payload);
        let response = endpoint.send(request).await?;

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| missing_field("choices[0].message.content"))?;

        Ok(ChatResponse {
            content: content.to_string(),
        })
    }
}

/// Anthropic `/v1/messages`
struct AnthropicModel(HttpEndpoint);

#[async_trait]
impl ChatModel for AnthropicModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, AgentError> {
        let endpoint = &self.0;
        let url = format!("{}/v1/messages", endpoint.base_url);
        debug!(%url, model = %endpoint.model, "Anthropic messages request");

        let (system, turns) = split_system(messages);
        let payload = json!({
            "model": endpoint.model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "system": system,
            "messages": turns
                .iter()
                .map(|m| json!({"role": m.role, "content": m.text}))
                .collect::<Vec<_>>(),
        });

        let request = endpoint
            .client
            .post(&url)
            .header("x-api-key", endpoint.credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload);
        let response = endpoint.send(request).await?;

        let blocks = response
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| missing_field("content"))?;
        let content = blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<String>();

        Ok(ChatResponse { content })
    }
}

/// Gemini `generateContent`
struct GeminiModel(HttpEndpoint);

#[async_trait]
impl ChatModel for GeminiModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, AgentError> {
        let endpoint = &self.0;
        let method = format!("{}:generateContent", endpoint.model);
        let url = endpoint.url_with_segments(&["v1beta", "models", method.as_str()])?;
        debug!(%url, "Gemini generateContent request");

        let (system, turns) = split_system(messages);
        let mut payload = json!({
            "contents": turns
                .iter()
                .map(|m| json!({"role": "user", "parts": [{"text": m.text}]}))
                .collect::<Vec<_>>(),
        });
        if !system.is_empty() {
            payload["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        let request = endpoint
            .client
            .post(url)
            .header("x-goog-api-key", endpoint.credential.expose())
            .json(&payload);
        let response = endpoint.send(request).await?;

        let parts = response
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| missing_field("candidates[0].content.parts"))?;
        let content = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>();

        Ok(ChatResponse { content })
    }
}

fn missing_field(field: &str) -> AgentError {
    AgentError::MalformedResponse(format!("missing field `{}`", field))
}
