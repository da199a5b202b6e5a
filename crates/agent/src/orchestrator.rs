use std::sync::Arc;
use std::time::Duration;

use restock_core::config::AppConfig;
use restock_core::flows::{FlowTrace, SuggestionEvent};
use restock_core::{
    AnalysisResult, SalesAnalyzer, StockSuggestionRequest, StockSuggestionResponse,
    SuggestionError,
};
use tracing::{error, info, warn};

use crate::guardrails::{GuardrailDecision, ResponseGuardrail};
use crate::llm::LlmError;
use crate::providers::client_from_config;
use crate::reasoning::{
    EngineDescriptor, LlmReasoningEngine, ReasoningContext, ReasoningEngine, ReasoningError,
    ReasoningOutput,
};

pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Outcome of one pipeline run together with every state it passed through.
#[derive(Clone, Debug)]
pub struct SuggestionRun {
    pub result: Result<StockSuggestionResponse, SuggestionError>,
    pub trace: FlowTrace,
}

/// Runs analysis, one reasoning call and output validation for a single
/// request. Holds no per-request state, so one instance serves concurrent
/// callers.
pub struct SuggestionOrchestrator {
    engine: Arc<dyn ReasoningEngine>,
    analyzer: SalesAnalyzer,
    guardrail: ResponseGuardrail,
    reasoning_timeout: Duration,
    horizon_days: u32,
}

impl SuggestionOrchestrator {
    pub fn new(engine: Arc<dyn ReasoningEngine>, reasoning_timeout: Duration) -> Self {
        Self {
            engine,
            analyzer: SalesAnalyzer::new(),
            guardrail: ResponseGuardrail,
            reasoning_timeout,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let client = client_from_config(&config.llm)?;
        let engine = LlmReasoningEngine::from_config(client, &config.llm);
        Ok(Self::new(
            Arc::new(engine),
            Duration::from_secs(config.suggestion.reasoning_timeout_secs),
        )
        .with_horizon_days(config.suggestion.horizon_days))
    }

    pub fn engine_descriptor(&self) -> EngineDescriptor {
        self.engine.descriptor()
    }

    pub fn reasoning_timeout(&self) -> Duration {
        self.reasoning_timeout
    }

    pub async fn suggest(
        &self,
        request: &StockSuggestionRequest,
    ) -> Result<StockSuggestionResponse, SuggestionError> {
        self.suggest_traced(request, None).await.result
    }

    pub async fn suggest_traced(
        &self,
        request: &StockSuggestionRequest,
        correlation_id: Option<&str>,
    ) -> SuggestionRun {
        let correlation_id = correlation_id.unwrap_or("none");
        let mut trace = FlowTrace::default();
        let result = self.run(request, correlation_id, &mut trace).await;
        SuggestionRun { result, trace }
    }

    async fn run(
        &self,
        request: &StockSuggestionRequest,
        correlation_id: &str,
        trace: &mut FlowTrace,
    ) -> Result<StockSuggestionResponse, SuggestionError> {
        info!(
            event_name = "suggestion.request.received",
            correlation_id,
            product_name = %request.product_name,
            records = request.sales_data.len(),
            "stock suggestion requested"
        );

        let violations = request.violations();
        if !violations.is_empty() {
            advance(trace, SuggestionEvent::RequestRejected, correlation_id);
            warn!(
                event_name = "suggestion.request.rejected",
                correlation_id,
                violations = %violations.join("; "),
                "stock suggestion request rejected"
            );
            return Err(SuggestionError::InvalidRequest { message: violations.join("; ") });
        }
        advance(trace, SuggestionEvent::RequestAccepted, correlation_id);

        let analysis = match self.analyzer.analyze(&request.sales_data) {
            Ok(analysis) => analysis,
            Err(parse_error) => {
                advance(trace, SuggestionEvent::AnalysisRejected, correlation_id);
                warn!(
                    event_name = "suggestion.request.rejected",
                    correlation_id,
                    error = %parse_error,
                    "sales data could not be analyzed"
                );
                return Err(parse_error.into());
            }
        };

        if !analysis.has_data() {
            advance(trace, SuggestionEvent::NoSalesData, correlation_id);
            info!(
                event_name = "suggestion.no_data",
                correlation_id,
                product_name = %request.product_name,
                "no sales data in period, skipping reasoning engine"
            );
            return Err(SuggestionError::NoSalesDataAvailable {
                product_name: request.product_name.clone(),
            });
        }
        advance(trace, SuggestionEvent::AnalysisCompleted, correlation_id);

        let context = ReasoningContext::new(
            request.product_name.clone(),
            request.current_stock,
            request.analysis_period.clone(),
            analysis.clone(),
            self.horizon_days,
        );

        let output = match self.call_engine(&context).await {
            Ok(output) => output,
            Err(ReasoningError::MalformedOutput(detail)) => {
                advance(trace, SuggestionEvent::ReasoningReturned, correlation_id);
                advance(trace, SuggestionEvent::OutputRejected, correlation_id);
                let violations = vec![format!("response is not a decodable JSON object: {detail}")];
                log_schema_rejection(correlation_id, &request.product_name, &violations);
                return Err(SuggestionError::SchemaValidationError { violations });
            }
            Err(unavailable) => {
                advance(trace, SuggestionEvent::ReasoningUnavailable, correlation_id);
                warn!(
                    event_name = "suggestion.reasoning.unavailable",
                    correlation_id,
                    product_name = %request.product_name,
                    error = %unavailable,
                    "reasoning engine unavailable"
                );
                return Err(SuggestionError::ReasoningEngineUnavailable {
                    message: unavailable.to_string(),
                });
            }
        };
        advance(trace, SuggestionEvent::ReasoningReturned, correlation_id);

        let validated = match self.guardrail.evaluate(&output) {
            GuardrailDecision::Accept(validated) => validated,
            GuardrailDecision::Reject { violations } => {
                advance(trace, SuggestionEvent::OutputRejected, correlation_id);
                log_schema_rejection(correlation_id, &request.product_name, &violations);
                return Err(SuggestionError::SchemaValidationError { violations });
            }
        };
        advance(trace, SuggestionEvent::OutputAccepted, correlation_id);

        warn_on_echo_mismatch(&output, &analysis, correlation_id);

        info!(
            event_name = "suggestion.completed",
            correlation_id,
            product_name = %request.product_name,
            sales_trend = analysis.sales_trend.as_str(),
            next_period_stock = validated.suggestion.next_period_stock,
            safety_stock = validated.suggestion.safety_stock,
            "stock suggestion completed"
        );

        Ok(StockSuggestionResponse {
            product_name: request.product_name.clone(),
            analysis,
            suggestion: validated.suggestion,
            reasoning: validated.reasoning,
        })
    }

    async fn call_engine(
        &self,
        context: &ReasoningContext,
    ) -> Result<ReasoningOutput, ReasoningError> {
        match tokio::time::timeout(self.reasoning_timeout, self.engine.generate(context)).await {
            Ok(result) => result,
            Err(_) => Err(ReasoningError::Timeout),
        }
    }
}

fn advance(trace: &mut FlowTrace, event: SuggestionEvent, correlation_id: &str) {
    if let Err(transition_error) = trace.advance(event) {
        error!(
            event_name = "suggestion.flow.invalid_transition",
            correlation_id,
            error = %transition_error,
            "suggestion flow rejected transition"
        );
    }
}

fn log_schema_rejection(correlation_id: &str, product_name: &str, violations: &[String]) {
    error!(
        event_name = "suggestion.schema.rejected",
        correlation_id,
        product_name,
        violations = %violations.join("; "),
        "reasoning engine output failed schema validation"
    );
}

/// The echoed analysis is always discarded; a mismatch only hints at prompt drift.
fn warn_on_echo_mismatch(output: &ReasoningOutput, analysis: &AnalysisResult, correlation_id: &str) {
    let Some(echoed) = &output.analysis else {
        return;
    };
    let local = serde_json::to_value(analysis).ok();
    if local.as_ref() != Some(echoed) {
        warn!(
            event_name = "suggestion.analysis.echo_mismatch",
            correlation_id,
            "reasoning engine echoed a different analysis; using local result"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use restock_core::flows::{FailureKind, SuggestionState};
    use restock_core::{
        analyze_sales, SalesRecord, SalesTrend, StockSuggestion, StockSuggestionRequest,
        SuggestionError,
    };
    use serde_json::{json, Value};

    use super::SuggestionOrchestrator;
    use crate::reasoning::{ReasoningContext, ReasoningEngine, ReasoningError, ReasoningOutput};

    enum Behaviour {
        Reply(Value),
        Fail(ReasoningError),
        Stall,
    }

    struct MockEngine {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl MockEngine {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self { behaviour, calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReasoningEngine for MockEngine {
        async fn generate(
            &self,
            context: &ReasoningContext,
        ) -> Result<ReasoningOutput, ReasoningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Reply(value) => {
                    let mut value = value.clone();
                    value["productName"] = json!(context.product_name);
                    ReasoningOutput::from_json(value)
                        .map_err(|error| ReasoningError::MalformedOutput(error.to_string()))
                }
                Behaviour::Fail(error) => Err(error.clone()),
                Behaviour::Stall => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(ReasoningError::Transport("stalled".to_string()))
                }
            }
        }
    }

    fn orchestrator(engine: Arc<MockEngine>) -> SuggestionOrchestrator {
        SuggestionOrchestrator::new(engine, Duration::from_millis(50))
    }

    fn valid_reply() -> Value {
        json!({
            "suggestion": {"nextPeriodStock": 200, "safetyStock": 50},
            "reasoning": "Sales are climbing, so stock ahead of demand."
        })
    }

    fn request(records: Vec<SalesRecord>) -> StockSuggestionRequest {
        StockSuggestionRequest {
            product_name: "Blue Mug".to_string(),
            current_stock: 14,
            sales_data: records,
            analysis_period: "30 days".to_string(),
        }
    }

    fn rising_sales() -> Vec<SalesRecord> {
        vec![
            SalesRecord::new("2024-01-01", 5),
            SalesRecord::new("2024-01-02", 5),
            SalesRecord::new("2024-01-03", 8),
            SalesRecord::new("2024-01-04", 8),
        ]
    }

    #[tokio::test]
    async fn valid_reply_produces_response_with_local_analysis() {
        let engine = MockEngine::new(Behaviour::Reply(valid_reply()));
        let orchestrator = orchestrator(engine.clone());

        let response = orchestrator.suggest(&request(rising_sales())).await.expect("response");

        assert_eq!(response.product_name, "Blue Mug");
        assert_eq!(response.analysis, analyze_sales(&rising_sales()).expect("analysis"));
        assert_eq!(response.analysis.sales_trend, SalesTrend::Increasing);
        assert_eq!(
            response.suggestion,
            StockSuggestion { next_period_stock: 200, safety_stock: 50 }
        );
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn echoed_analysis_is_overwritten() {
        let mut reply = valid_reply();
        reply["analysis"] = json!({
            "totalSold": 9999,
            "salesTrend": "decreasing",
            "peakDays": ["01 Jan: 9999 units"],
            "averageDailySales": 42.0
        });
        let orchestrator = orchestrator(MockEngine::new(Behaviour::Reply(reply)));

        let response = orchestrator.suggest(&request(rising_sales())).await.expect("response");

        assert_eq!(response.analysis.total_sold, 26);
        assert_eq!(response.analysis.sales_trend, SalesTrend::Increasing);
        assert_eq!(response.analysis.average_daily_sales, 6.5);
    }

    #[tokio::test]
    async fn empty_sales_short_circuits_without_engine_call() {
        let engine = MockEngine::new(Behaviour::Reply(valid_reply()));
        let orchestrator = orchestrator(engine.clone());

        let run = orchestrator.suggest_traced(&request(Vec::new()), Some("corr-1")).await;

        assert_eq!(
            run.result,
            Err(SuggestionError::NoSalesDataAvailable { product_name: "Blue Mug".to_string() })
        );
        assert_eq!(run.trace.current(), SuggestionState::NoDataExit);
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn stalled_engine_times_out_once_without_retry() {
        let engine = MockEngine::new(Behaviour::Stall);
        let orchestrator = orchestrator(engine.clone());

        let run = orchestrator.suggest_traced(&request(rising_sales()), None).await;

        let error = run.result.expect_err("timeout");
        assert!(matches!(error, SuggestionError::ReasoningEngineUnavailable { .. }));
        assert!(error.is_retryable());
        assert_eq!(
            run.trace.current(),
            SuggestionState::Failed(FailureKind::ReasoningEngineUnavailable)
        );
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_unavailable() {
        let engine =
            MockEngine::new(Behaviour::Fail(ReasoningError::Transport("refused".to_string())));
        let orchestrator = orchestrator(engine.clone());

        let error = orchestrator.suggest(&request(rising_sales())).await.expect_err("unavailable");

        assert_eq!(error.kind(), "reasoning_engine_unavailable");
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn negative_safety_stock_is_a_schema_error() {
        let reply = json!({
            "suggestion": {"nextPeriodStock": 100, "safetyStock": -3},
            "reasoning": "Trim the buffer."
        });
        let engine = MockEngine::new(Behaviour::Reply(reply));
        let orchestrator = orchestrator(engine.clone());

        let run = orchestrator.suggest_traced(&request(rising_sales()), None).await;

        match run.result {
            Err(SuggestionError::SchemaValidationError { violations }) => {
                assert_eq!(violations, vec!["suggestion.safetyStock must be >= 0, got -3"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
        assert_eq!(run.trace.current(), SuggestionState::Failed(FailureKind::SchemaValidation));
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_engine_output_is_a_schema_error() {
        let engine =
            MockEngine::new(Behaviour::Fail(ReasoningError::MalformedOutput("eof".to_string())));
        let orchestrator = orchestrator(engine);

        let error = orchestrator.suggest(&request(rising_sales())).await.expect_err("schema");

        assert_eq!(error.kind(), "schema_validation_error");
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_analysis_or_engine() {
        let engine = MockEngine::new(Behaviour::Reply(valid_reply()));
        let orchestrator = orchestrator(engine.clone());
        let mut bad = request(rising_sales());
        bad.product_name = "   ".to_string();
        bad.current_stock = -1;

        let run = orchestrator.suggest_traced(&bad, None).await;

        match run.result {
            Err(SuggestionError::InvalidRequest { message }) => {
                assert!(message.contains("productName"));
                assert!(message.contains("currentStock"));
            }
            other => panic!("expected invalid request, got {other:?}"),
        }
        assert_eq!(
            run.trace.states(),
            &[SuggestionState::Validating, SuggestionState::Failed(FailureKind::InvalidRequest)]
        );
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn unparseable_date_is_an_invalid_request() {
        let engine = MockEngine::new(Behaviour::Reply(valid_reply()));
        let orchestrator = orchestrator(engine.clone());
        let records = vec![SalesRecord::new("2024-01-01", 3), SalesRecord::new("last tuesday", 2)];

        let error = orchestrator.suggest(&request(records)).await.expect_err("bad date");

        assert_eq!(error.kind(), "invalid_request");
        assert!(error.to_string().contains("last tuesday"));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn happy_path_trace_visits_every_state() {
        let orchestrator = orchestrator(MockEngine::new(Behaviour::Reply(valid_reply())));

        let run = orchestrator.suggest_traced(&request(rising_sales()), Some("corr-2")).await;

        assert!(run.result.is_ok());
        assert_eq!(
            run.trace.states(),
            &[
                SuggestionState::Validating,
                SuggestionState::Analyzing,
                SuggestionState::Reasoning,
                SuggestionState::ValidatingOutput,
                SuggestionState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_requests_are_independent() {
        let engine = MockEngine::new(Behaviour::Reply(valid_reply()));
        let orchestrator = orchestrator(engine.clone());
        let mut other = request(vec![SalesRecord::new("2024-02-01", 7)]);
        other.product_name = "Red Plate".to_string();

        let first_request = request(rising_sales());
        let (first, second) =
            tokio::join!(orchestrator.suggest(&first_request), orchestrator.suggest(&other));

        let first = first.expect("first");
        let second = second.expect("second");
        assert_eq!(first.product_name, "Blue Mug");
        assert_eq!(second.product_name, "Red Plate");
        assert_eq!(second.analysis.sales_trend, SalesTrend::Stable);
        assert_eq!(second.analysis.peak_days, vec!["01 Feb: 7 units".to_string()]);
        assert_eq!(engine.calls(), 2);
    }
}
