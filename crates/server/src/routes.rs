use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use restock_agent::SuggestionOrchestrator;
use restock_core::{
    analyze_sales, AnalysisResult, InterfaceError, SalesRecord, StockSuggestionRequest,
    StockSuggestionResponse, SuggestionError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::health::health;

pub const RETRY_AFTER_SECS: u64 = 10;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SuggestionOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SuggestionOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/stock-suggestions", post(create_stock_suggestion))
        .route("/api/v1/sales-analysis", post(analyze_sales_data))
        .with_state(state)
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalysisRequest {
    #[serde(default)]
    pub sales_data: Vec<SalesRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    pub retryable: bool,
    pub correlation_id: String,
}

/// Interface-facing failure; the status code is chosen by the error kind.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.message().to_string(),
            kind: self.0.kind().to_string(),
            retryable: self.0.retryable(),
            correlation_id: self.0.correlation_id().to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}

fn rejected_body(rejection: JsonRejection, correlation_id: String) -> ApiError {
    let error = SuggestionError::InvalidRequest { message: rejection.body_text() };
    ApiError(error.into_interface(correlation_id))
}

pub async fn create_stock_suggestion(
    State(state): State<AppState>,
    payload: Result<Json<StockSuggestionRequest>, JsonRejection>,
) -> Result<Json<StockSuggestionResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return Err(rejected_body(rejection, correlation_id)),
    };

    let run = state.orchestrator.suggest_traced(&request, Some(&correlation_id)).await;
    debug!(
        event_name = "suggestion.flow.trace",
        correlation_id = %correlation_id,
        states = ?run.trace.states(),
        "suggestion flow finished"
    );

    run.result.map(Json).map_err(|error| ApiError(error.into_interface(correlation_id)))
}

pub async fn analyze_sales_data(
    payload: Result<Json<SalesAnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return Err(rejected_body(rejection, correlation_id)),
    };

    match analyze_sales(&request.sales_data) {
        Ok(analysis) => {
            info!(
                event_name = "analysis.completed",
                correlation_id = %correlation_id,
                records = request.sales_data.len(),
                sales_trend = analysis.sales_trend.as_str(),
                "sales analysis completed"
            );
            Ok(Json(analysis))
        }
        Err(parse_error) => {
            Err(ApiError(SuggestionError::from(parse_error).into_interface(correlation_id)))
        }
    }
}
