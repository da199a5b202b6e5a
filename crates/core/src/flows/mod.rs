pub mod engine;
pub mod states;

pub use engine::{FlowTrace, FlowTransitionError, SuggestionFlow};
pub use states::{FailureKind, SuggestionEvent, SuggestionState, TransitionOutcome};
