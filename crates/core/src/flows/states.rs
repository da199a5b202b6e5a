use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    ReasoningEngineUnavailable,
    SchemaValidation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionState {
    Validating,
    Analyzing,
    NoDataExit,
    Reasoning,
    ValidatingOutput,
    Done,
    Failed(FailureKind),
}

impl SuggestionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoDataExit | Self::Done | Self::Failed(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionEvent {
    RequestAccepted,
    RequestRejected,
    AnalysisCompleted,
    AnalysisRejected,
    NoSalesData,
    ReasoningReturned,
    ReasoningUnavailable,
    OutputAccepted,
    OutputRejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SuggestionState,
    pub to: SuggestionState,
    pub event: SuggestionEvent,
}
