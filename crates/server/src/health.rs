use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use restock_agent::reasoning::EngineDescriptor;
use serde::Serialize;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningEngineHealth {
    pub provider: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub reasoning_engine: ReasoningEngineHealth,
    pub checked_at: String,
}

/// Liveness only: the reasoning engine is reported, never called, since a
/// probe would cost a model request.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let EngineDescriptor { provider, model } = state.orchestrator.engine_descriptor();

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "restock-server runtime initialized".to_string(),
        },
        reasoning_engine: ReasoningEngineHealth {
            provider,
            model,
            timeout_secs: state.orchestrator.reasoning_timeout().as_secs(),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
