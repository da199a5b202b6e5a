use std::path::Path;

use restock_agent::SuggestionOrchestrator;
use restock_core::config::AppConfig;
use restock_core::{StockSuggestionRequest, SuggestionError};

use crate::commands::{
    load_options, read_json_file, CommandResult, EXIT_ENGINE, EXIT_INVALID, EXIT_NO_DATA,
};

const COMMAND: &str = "suggest";

pub fn run(input: &Path, config_path: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(load_options(config_path)) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_INVALID,
            )
        }
    };

    let orchestrator = match SuggestionOrchestrator::from_config(&config) {
        Ok(orchestrator) => orchestrator,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "reasoning_engine_setup",
                error.to_string(),
                EXIT_ENGINE,
            )
        }
    };

    run_with(&orchestrator, input)
}

/// Runs the pipeline for the request stored at `input` with a prepared orchestrator.
pub fn run_with(orchestrator: &SuggestionOrchestrator, input: &Path) -> CommandResult {
    let request = match read_request(input) {
        Ok(request) => request,
        Err(message) => return CommandResult::failure(COMMAND, "input", message, EXIT_INVALID),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_ENGINE,
            )
        }
    };

    match runtime.block_on(orchestrator.suggest(&request)) {
        Ok(response) => CommandResult::success_with_data(
            COMMAND,
            response.reasoning.clone(),
            serde_json::to_value(&response).ok(),
        ),
        Err(error) => failure_for(&error),
    }
}

fn read_request(input: &Path) -> Result<StockSuggestionRequest, String> {
    let document = read_json_file(input)?;
    serde_json::from_value(document).map_err(|error| format!("invalid suggestion request: {error}"))
}

fn failure_for(error: &SuggestionError) -> CommandResult {
    let exit_code = match error {
        SuggestionError::InvalidRequest { .. } => EXIT_INVALID,
        SuggestionError::NoSalesDataAvailable { .. } => EXIT_NO_DATA,
        SuggestionError::ReasoningEngineUnavailable { .. }
        | SuggestionError::SchemaValidationError { .. } => EXIT_ENGINE,
    };
    CommandResult::failure(COMMAND, error.kind(), error.to_string(), exit_code)
}
