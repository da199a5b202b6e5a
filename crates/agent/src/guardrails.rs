//! Output guardrail for reasoning engine replies.
//!
//! The engine never talks to the caller directly: its raw output is checked
//! field by field here, and only a fully valid reply is turned into a
//! [`StockSuggestion`]. Every violation is collected so a rejection explains
//! all of what was wrong, not just the first problem.

use restock_core::StockSuggestion;
use serde_json::Value;

use crate::reasoning::ReasoningOutput;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedOutput {
    pub suggestion: StockSuggestion,
    pub reasoning: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Accept(ValidatedOutput),
    Reject { violations: Vec<String> },
}

impl GuardrailDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept(_))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResponseGuardrail;

impl ResponseGuardrail {
    pub fn evaluate(&self, output: &ReasoningOutput) -> GuardrailDecision {
        let mut violations = Vec::new();

        let (next_period_stock, safety_stock) = match &output.suggestion {
            Some(suggestion) => (
                stock_quantity(
                    "suggestion.nextPeriodStock",
                    suggestion.next_period_stock.as_ref(),
                    &mut violations,
                ),
                stock_quantity(
                    "suggestion.safetyStock",
                    suggestion.safety_stock.as_ref(),
                    &mut violations,
                ),
            ),
            None => {
                violations.push("suggestion is missing".to_string());
                (None, None)
            }
        };

        let reasoning = match &output.reasoning {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Some(Value::String(_)) => {
                violations.push("reasoning must not be blank".to_string());
                None
            }
            Some(other) => {
                violations.push(format!("reasoning must be a string, got {}", type_name(other)));
                None
            }
            None => {
                violations.push("reasoning is missing".to_string());
                None
            }
        };

        match (next_period_stock, safety_stock, reasoning) {
            (Some(next_period_stock), Some(safety_stock), Some(reasoning))
                if violations.is_empty() =>
            {
                GuardrailDecision::Accept(ValidatedOutput {
                    suggestion: StockSuggestion { next_period_stock, safety_stock },
                    reasoning,
                })
            }
            _ => GuardrailDecision::Reject { violations },
        }
    }
}

/// Accepts non-negative integers, including whole-valued floats such as `40.0`.
fn stock_quantity(field: &str, value: Option<&Value>, violations: &mut Vec<String>) -> Option<u64> {
    let Some(value) = value else {
        violations.push(format!("{field} is missing"));
        return None;
    };

    let Value::Number(number) = value else {
        violations.push(format!("{field} must be a number, got {}", type_name(value)));
        return None;
    };

    if let Some(quantity) = number.as_u64() {
        return Some(quantity);
    }
    if let Some(signed) = number.as_i64() {
        violations.push(format!("{field} must be >= 0, got {signed}"));
        return None;
    }

    match number.as_f64() {
        Some(float) if float < 0.0 => {
            violations.push(format!("{field} must be >= 0, got {float}"));
            None
        }
        Some(float) if float.fract() == 0.0 && float <= u64::MAX as f64 => Some(float as u64),
        _ => {
            violations.push(format!("{field} must be a whole number, got {number}"));
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
