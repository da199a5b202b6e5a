use thiserror::Error;

use crate::flows::states::{FailureKind, SuggestionEvent, SuggestionState, TransitionOutcome};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuggestionFlow;

impl SuggestionFlow {
    pub fn initial_state(&self) -> SuggestionState {
        SuggestionState::Validating
    }

    pub fn apply(
        &self,
        current: SuggestionState,
        event: SuggestionEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        use SuggestionEvent::{
            AnalysisCompleted, AnalysisRejected, NoSalesData, OutputAccepted, OutputRejected,
            ReasoningReturned, ReasoningUnavailable, RequestAccepted, RequestRejected,
        };
        use SuggestionState::{
            Analyzing, Done, Failed, NoDataExit, Reasoning, Validating, ValidatingOutput,
        };

        let to = match (current, event) {
            (Validating, RequestAccepted) => Analyzing,
            (Validating, RequestRejected) => Failed(FailureKind::InvalidRequest),
            (Analyzing, AnalysisCompleted) => Reasoning,
            (Analyzing, NoSalesData) => NoDataExit,
            (Analyzing, AnalysisRejected) => Failed(FailureKind::InvalidRequest),
            (Reasoning, ReasoningReturned) => ValidatingOutput,
            (Reasoning, ReasoningUnavailable) => Failed(FailureKind::ReasoningEngineUnavailable),
            (ValidatingOutput, OutputAccepted) => Done,
            (ValidatingOutput, OutputRejected) => Failed(FailureKind::SchemaValidation),
            _ => return Err(FlowTransitionError::InvalidTransition { state: current, event }),
        };

        Ok(TransitionOutcome { from: current, to, event })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: SuggestionState, event: SuggestionEvent },
}

/// Records every state one pipeline run passes through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowTrace {
    flow: SuggestionFlow,
    states: Vec<SuggestionState>,
}

impl Default for FlowTrace {
    fn default() -> Self {
        let flow = SuggestionFlow;
        Self { states: vec![flow.initial_state()], flow }
    }
}

impl FlowTrace {
    pub fn current(&self) -> SuggestionState {
        self.states.last().copied().unwrap_or_else(|| self.flow.initial_state())
    }

    pub fn advance(
        &mut self,
        event: SuggestionEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        let outcome = self.flow.apply(self.current(), event)?;
        self.states.push(outcome.to);
        Ok(outcome)
    }

    pub fn states(&self) -> &[SuggestionState] {
        &self.states
    }
}
