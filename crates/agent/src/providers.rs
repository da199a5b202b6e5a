//! HTTP-backed [`LlmClient`] implementations for the providers the config
//! layer knows about.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use restock_core::config::{LlmConfig, LlmProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::llm::{CompletionRequest, LlmClient, LlmError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Builds the client selected by `config.provider`.
pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let http = http_client(config.timeout_secs)?;
    let base_url = config.effective_base_url().to_string();
    let model = config.model.clone();

    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::OpenAi => {
            Arc::new(OpenAiClient { http, api_key: required_key(config)?, base_url, model })
        }
        LlmProvider::Anthropic => {
            Arc::new(AnthropicClient { http, api_key: required_key(config)?, base_url, model })
        }
        LlmProvider::Ollama => Arc::new(OllamaClient { http, base_url, model }),
    };

    info!(
        event_name = "system.llm.client_ready",
        provider = client.provider_name(),
        model = %config.model,
        "llm client initialized"
    );
    Ok(client)
}

fn http_client(timeout_secs: u64) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|error| LlmError::Configuration(error.to_string()))
}

fn required_key(config: &LlmConfig) -> Result<SecretString, LlmError> {
    config.api_key.clone().ok_or_else(|| {
        LlmError::Configuration(format!(
            "{} provider requires llm.api_key",
            config.provider.as_str()
        ))
    })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

async fn send_json<R>(request: RequestBuilder) -> Result<R, LlmError>
where
    R: DeserializeOwned,
{
    let response = request.send().await.map_err(|error| {
        if error.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(error.to_string())
        }
    })?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(LlmError::Api(format!("HTTP {status}: {body}")));
    }

    response.json::<R>().await.map_err(|error| {
        if error.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::InvalidResponse(error.to_string())
        }
    })
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn chat_messages(request: &CompletionRequest) -> Vec<ChatMessage<'_>> {
    vec![
        ChatMessage { role: "system", content: &request.system },
        ChatMessage { role: "user", content: &request.prompt },
    ]
}

pub struct OpenAiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: SecretString,
        base_url: Option<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| LlmProvider::OpenAi.default_base_url().to_string()),
            model: model.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn openai_body<'a>(model: &'a str, request: &'a CompletionRequest) -> OpenAiRequest<'a> {
    OpenAiRequest {
        model,
        messages: chat_messages(request),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        response_format: request.json_output.then_some(OpenAiResponseFormat { kind: "json_object" }),
    }
}

fn openai_content(response: OpenAiResponse) -> Result<String, LlmError> {
    if let Some(usage) = &response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "openai completion usage"
        );
    }

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let http_request = self
            .http
            .post(endpoint(&self.base_url, "/v1/chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&openai_body(&self.model, request));

        openai_content(send_json(http_request).await?)
    }
}

pub struct AnthropicClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn anthropic_body<'a>(model: &'a str, request: &'a CompletionRequest) -> AnthropicRequest<'a> {
    AnthropicRequest {
        model,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        system: &request.system,
        messages: vec![ChatMessage { role: "user", content: &request.prompt }],
    }
}

fn anthropic_content(response: AnthropicResponse) -> Result<String, LlmError> {
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(LlmError::InvalidResponse("no text content in response".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let http_request = self
            .http
            .post(endpoint(&self.base_url, "/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&anthropic_body(&self.model, request));

        anthropic_content(send_json(http_request).await?)
    }
}

pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        Ok(Self { http: http_client(timeout_secs)?, base_url: base_url.into(), model: model.into() })
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

fn ollama_body<'a>(model: &'a str, request: &'a CompletionRequest) -> OllamaRequest<'a> {
    OllamaRequest {
        model,
        messages: chat_messages(request),
        stream: false,
        format: request.json_output.then_some("json"),
        options: OllamaOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        },
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let http_request = self
            .http
            .post(endpoint(&self.base_url, "/api/chat"))
            .json(&ollama_body(&self.model, request));

        let response: OllamaResponse = send_json(http_request).await?;
        Ok(response.message.content)
    }
}
