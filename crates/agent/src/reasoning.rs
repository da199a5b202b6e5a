//! The reasoning engine seam: the typed context handed to the engine, the raw
//! output it returns, and the LLM-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;
use restock_core::config::LlmConfig;
use restock_core::AnalysisResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompt::{render_user_prompt, SYSTEM_PROMPT};

pub const SAFETY_STOCK_RATIO: f64 = 0.25;
pub const TREND_BUFFER_RATIO: f64 = 0.2;

/// Advisory figures restated for the engine. The engine produces the final
/// numbers; nothing here is enforced.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningGuidance {
    pub horizon_days: u32,
    pub baseline_next_period_stock: u64,
    pub trend_buffer_ratio: f64,
    pub safety_stock_ratio: f64,
}

impl ReasoningGuidance {
    pub fn for_analysis(analysis: &AnalysisResult, horizon_days: u32) -> Self {
        let baseline = (analysis.average_daily_sales * f64::from(horizon_days)).ceil();
        let trend_buffer_ratio =
            if analysis.sales_trend.is_stable() { 0.0 } else { TREND_BUFFER_RATIO };

        Self {
            horizon_days,
            baseline_next_period_stock: baseline.max(0.0) as u64,
            trend_buffer_ratio,
            safety_stock_ratio: SAFETY_STOCK_RATIO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningContext {
    pub product_name: String,
    pub current_stock: i64,
    pub analysis_period: String,
    pub analysis: AnalysisResult,
    pub guidance: ReasoningGuidance,
}

impl ReasoningContext {
    pub fn new(
        product_name: impl Into<String>,
        current_stock: i64,
        analysis_period: impl Into<String>,
        analysis: AnalysisResult,
        horizon_days: u32,
    ) -> Self {
        let guidance = ReasoningGuidance::for_analysis(&analysis, horizon_days);
        Self {
            product_name: product_name.into(),
            current_stock,
            analysis_period: analysis_period.into(),
            analysis,
            guidance,
        }
    }
}

/// Unvalidated engine output. Every field is optional and numbers keep their
/// raw JSON form so the guardrail can report exactly what was wrong.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningOutput {
    #[serde(default)]
    pub product_name: Option<Value>,
    #[serde(default)]
    pub analysis: Option<Value>,
    #[serde(default)]
    pub suggestion: Option<ReasoningSuggestion>,
    #[serde(default)]
    pub reasoning: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningSuggestion {
    #[serde(default)]
    pub next_period_stock: Option<Value>,
    #[serde(default)]
    pub safety_stock: Option<Value>,
}

impl ReasoningOutput {
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReasoningError {
    #[error("reasoning engine timed out")]
    Timeout,
    #[error("reasoning engine transport failure: {0}")]
    Transport(String),
    #[error("reasoning engine returned malformed output: {0}")]
    MalformedOutput(String),
}

impl From<LlmError> for ReasoningError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::Timeout => Self::Timeout,
            LlmError::InvalidResponse(message) => Self::MalformedOutput(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineDescriptor {
    pub provider: String,
    pub model: String,
}

#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn generate(
        &self,
        context: &ReasoningContext,
    ) -> Result<ReasoningOutput, ReasoningError>;

    fn descriptor(&self) -> EngineDescriptor {
        EngineDescriptor { provider: "custom".to_string(), model: "unknown".to_string() }
    }
}

pub struct LlmReasoningEngine<C: ?Sized = dyn LlmClient> {
    client: Arc<C>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl<C: LlmClient + ?Sized> LlmReasoningEngine<C> {
    pub fn new(
        client: Arc<C>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self { client, model: model.into(), max_tokens, temperature }
    }

    fn completion_request(&self, context: &ReasoningContext) -> CompletionRequest {
        CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: render_user_prompt(context),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            json_output: true,
        }
    }
}

impl LlmReasoningEngine {
    pub fn from_config(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self::new(client, config.model.clone(), config.max_tokens, config.temperature)
    }
}

#[async_trait]
impl<C: LlmClient + ?Sized> ReasoningEngine for LlmReasoningEngine<C> {
    async fn generate(
        &self,
        context: &ReasoningContext,
    ) -> Result<ReasoningOutput, ReasoningError> {
        let raw = self.client.complete(&self.completion_request(context)).await?;
        debug!(
            provider = self.client.provider_name(),
            response_len = raw.len(),
            "reasoning engine replied"
        );
        parse_output(&raw)
    }

    fn descriptor(&self) -> EngineDescriptor {
        EngineDescriptor {
            provider: self.client.provider_name().to_string(),
            model: self.model.clone(),
        }
    }
}

pub fn parse_output(raw: &str) -> Result<ReasoningOutput, ReasoningError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|error| ReasoningError::MalformedOutput(error.to_string()))?;

    if !value.is_object() {
        return Err(ReasoningError::MalformedOutput("expected a JSON object".to_string()));
    }

    ReasoningOutput::from_json(value)
        .map_err(|error| ReasoningError::MalformedOutput(error.to_string()))
}

/// Returns the body of a leading Markdown code fence, or the trimmed input.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(newline) = after_open.find('\n') else {
        return trimmed;
    };
    let body = &after_open[newline + 1..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
