use std::path::Path;

use restock_agent::providers::client_from_config;
use restock_core::config::{AppConfig, LlmProvider};
use serde::Serialize;

use crate::commands::{load_options, CommandResult, EXIT_INVALID, EXIT_OK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, config_path: Option<&Path>) -> CommandResult {
    let report = build_report(config_path);
    let exit_code = if report.overall_status == CheckStatus::Pass { EXIT_OK } else { EXIT_INVALID };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(config_path: Option<&Path>) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(load_options(config_path)) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_reasoning_engine(&config));
            checks.push(check_reasoning_budget(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["reasoning_engine_setup", "reasoning_timeout_budget"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Builds the HTTP client without sending a request.
fn check_reasoning_engine(config: &AppConfig) -> DoctorCheck {
    match client_from_config(&config.llm) {
        Ok(client) => {
            let key_note = match config.llm.provider {
                LlmProvider::Ollama => "no api key required",
                LlmProvider::OpenAi | LlmProvider::Anthropic => "api key present",
            };
            DoctorCheck {
                name: "reasoning_engine_setup",
                status: CheckStatus::Pass,
                details: format!(
                    "{} client for model `{}` at {} ({key_note})",
                    client.provider_name(),
                    config.llm.model,
                    config.llm.effective_base_url()
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "reasoning_engine_setup",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// A reasoning bound shorter than the HTTP timeout cuts requests off early.
fn check_reasoning_budget(config: &AppConfig) -> DoctorCheck {
    let reasoning = config.suggestion.reasoning_timeout_secs;
    let http = config.llm.timeout_secs;

    if reasoning >= http {
        DoctorCheck {
            name: "reasoning_timeout_budget",
            status: CheckStatus::Pass,
            details: format!("reasoning bound {reasoning}s covers http timeout {http}s"),
        }
    } else {
        DoctorCheck {
            name: "reasoning_timeout_budget",
            status: CheckStatus::Fail,
            details: format!(
                "suggestion.reasoning_timeout_secs ({reasoning}s) is shorter than llm.timeout_secs ({http}s)"
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
