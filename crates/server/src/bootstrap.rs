use std::sync::Arc;

use restock_agent::llm::LlmError;
use restock_agent::SuggestionOrchestrator;
use restock_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub orchestrator: Arc<SuggestionOrchestrator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("reasoning engine setup failed: {0}")]
    ReasoningEngine(#[source] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        "starting application bootstrap"
    );

    let orchestrator =
        SuggestionOrchestrator::from_config(&config).map_err(BootstrapError::ReasoningEngine)?;
    info!(
        event_name = "system.bootstrap.reasoning_engine_ready",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        reasoning_timeout_secs = config.suggestion.reasoning_timeout_secs,
        "reasoning engine configured"
    );

    Ok(Application { config, orchestrator: Arc::new(orchestrator) })
}
