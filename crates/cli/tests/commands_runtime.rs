use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use restock_agent::reasoning::{ReasoningContext, ReasoningEngine, ReasoningError, ReasoningOutput};
use restock_agent::SuggestionOrchestrator;
use restock_cli::commands::{analyze, config, doctor, suggest};
use serde_json::{json, Value};
use tempfile::TempDir;

struct CannedEngine {
    reply: Value,
    calls: AtomicUsize,
}

#[async_trait]
impl ReasoningEngine for CannedEngine {
    async fn generate(
        &self,
        _context: &ReasoningContext,
    ) -> Result<ReasoningOutput, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ReasoningOutput::from_json(self.reply.clone())
            .map_err(|error| ReasoningError::MalformedOutput(error.to_string()))
    }
}

fn canned(reply: Value) -> (Arc<CannedEngine>, SuggestionOrchestrator) {
    let engine = Arc::new(CannedEngine { reply, calls: AtomicUsize::new(0) });
    let orchestrator = SuggestionOrchestrator::new(engine.clone(), Duration::from_secs(1));
    (engine, orchestrator)
}

#[test]
fn analyze_reports_statistics_for_wrapped_records() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_json(
        dir.path(),
        "sales.json",
        &json!({
            "salesData": [
                {"orderDate": "2024-01-01", "quantity": 5},
                {"orderDate": "2024-01-02", "quantity": 5},
                {"orderDate": "2024-01-03", "quantity": 8},
                {"orderDate": "2024-01-04", "quantity": 8}
            ]
        }),
    );

    let result = analyze::run(&input);
    assert_eq!(result.exit_code, 0, "expected successful analysis");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "analyze");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["totalSold"], 26);
    assert_eq!(payload["data"]["salesTrend"], "increasing");
    assert_eq!(payload["data"]["peakDays"][0], "03 Jan: 8 units");
}

#[test]
fn analyze_rejects_unparseable_dates() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_json(
        dir.path(),
        "sales.json",
        &json!([{"orderDate": "not-a-date", "quantity": 1}]),
    );

    let result = analyze::run(&input);
    assert_eq!(result.exit_code, 2, "expected validation failure code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "invalid_request");
}

#[test]
fn analyze_reports_missing_input_file() {
    let dir = TempDir::new().expect("temp dir");
    let result = analyze::run(&dir.path().join("missing.json"));

    assert_eq!(result.exit_code, 2);
    assert_eq!(parse_payload(&result.output)["error_class"], "input");
}

#[test]
fn suggest_returns_validated_response() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_json(dir.path(), "request.json", &request_json(json!([
        {"orderDate": "2024-03-01", "quantity": 4},
        {"orderDate": "2024-03-02", "quantity": 6}
    ])));
    let (engine, orchestrator) = canned(json!({
        "suggestion": {"nextPeriodStock": 150, "safetyStock": 38},
        "reasoning": "Five units a day on average."
    }));

    let result = suggest::run_with(&orchestrator, &input);
    assert_eq!(result.exit_code, 0, "expected successful suggestion");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "suggest");
    assert_eq!(payload["message"], "Five units a day on average.");
    assert_eq!(payload["data"]["suggestion"]["nextPeriodStock"], 150);
    assert_eq!(payload["data"]["analysis"]["totalSold"], 10);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn suggest_with_empty_sales_exits_with_no_data_code() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_json(dir.path(), "request.json", &request_json(json!([])));
    let (engine, orchestrator) = canned(json!({}));

    let result = suggest::run_with(&orchestrator, &input);

    assert_eq!(result.exit_code, 3);
    assert_eq!(parse_payload(&result.output)["error_class"], "no_sales_data_available");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn suggest_with_schema_violation_exits_with_engine_code() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_json(
        dir.path(),
        "request.json",
        &request_json(json!([{"orderDate": "2024-03-01", "quantity": 4}])),
    );
    let (_engine, orchestrator) = canned(json!({
        "suggestion": {"nextPeriodStock": 10, "safetyStock": -1},
        "reasoning": "Negative buffer."
    }));

    let result = suggest::run_with(&orchestrator, &input);

    assert_eq!(result.exit_code, 4);
    assert_eq!(parse_payload(&result.output)["error_class"], "schema_validation_error");
}

#[test]
fn suggest_fails_config_validation_for_hosted_provider_without_key() {
    with_env(&[("RESTOCK_LLM_PROVIDER", "openai")], || {
        let dir = TempDir::new().expect("temp dir");
        let input = write_json(dir.path(), "request.json", &request_json(json!([])));

        let result = suggest::run(&input, None);

        assert_eq!(result.exit_code, 2, "expected config validation failure code");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().unwrap_or("").contains("llm.api_key"));
    });
}

#[test]
fn config_redacts_api_key_and_attributes_sources() {
    with_env(
        &[("RESTOCK_LLM_PROVIDER", "anthropic"), ("RESTOCK_LLM_API_KEY", "sk-ant-secret")],
        || {
            let dir = TempDir::new().expect("temp dir");
            let config_path = dir.path().join("restock.toml");
            fs::write(&config_path, "[llm]\nmodel = \"claude-test\"\n").expect("write config");

            let output = config::run(Some(&config_path));

            assert!(!output.contains("sk-ant-secret"), "api key must be redacted");
            assert!(output.contains("- llm.api_key = <redacted> (source: env (RESTOCK_LLM_API_KEY))"));
            assert!(output.contains("- llm.provider = anthropic (source: env (RESTOCK_LLM_PROVIDER))"));
            assert!(output.contains("- llm.model = claude-test (source: file ("));
            assert!(output.contains("- server.port = 8080 (source: default)"));
        },
    );
}

#[test]
fn doctor_passes_with_default_config() {
    with_env(&[], || {
        let result = doctor::run(true, None);
        assert_eq!(result.exit_code, 0, "expected passing doctor report");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"][1]["name"], "reasoning_engine_setup");
    });
}

#[test]
fn doctor_flags_reasoning_bound_shorter_than_http_timeout() {
    with_env(
        &[("RESTOCK_SUGGESTION_REASONING_TIMEOUT_SECS", "5"), ("RESTOCK_LLM_TIMEOUT_SECS", "20")],
        || {
            let result = doctor::run(false, None);

            assert_eq!(result.exit_code, 2);
            assert!(result.output.contains("- [fail] reasoning_timeout_budget"));
        },
    );
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[("RESTOCK_SERVER_PORT", "eighty")], || {
        let result = doctor::run(true, None);

        assert_eq!(result.exit_code, 2);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

fn request_json(sales_data: Value) -> Value {
    json!({
        "productName": "Oak Shelf",
        "currentStock": 3,
        "salesData": sales_data,
        "analysisPeriod": "14 days"
    })
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, value.to_string()).expect("write json fixture");
    path
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "RESTOCK_LLM_PROVIDER",
        "RESTOCK_LLM_API_KEY",
        "RESTOCK_LLM_BASE_URL",
        "RESTOCK_LLM_MODEL",
        "RESTOCK_LLM_TIMEOUT_SECS",
        "RESTOCK_LLM_TEMPERATURE",
        "RESTOCK_LLM_MAX_TOKENS",
        "RESTOCK_SUGGESTION_REASONING_TIMEOUT_SECS",
        "RESTOCK_SUGGESTION_HORIZON_DAYS",
        "RESTOCK_SERVER_BIND_ADDRESS",
        "RESTOCK_SERVER_PORT",
        "RESTOCK_LOGGING_LEVEL",
        "RESTOCK_LOGGING_FORMAT",
        "RESTOCK_LOG_LEVEL",
        "RESTOCK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
