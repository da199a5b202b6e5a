use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider to constrain its answer to a JSON object.
    pub json_output: bool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm request timed out")]
    Timeout,
    #[error("llm network error: {0}")]
    Network(String),
    #[error("llm provider rate limited the request")]
    RateLimited,
    #[error("llm api error: {0}")]
    Api(String),
    #[error("llm returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("llm client configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider_name(&self) -> &'static str;
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
