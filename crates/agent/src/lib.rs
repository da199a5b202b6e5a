//! Reasoning side of the restock pipeline.
//!
//! This crate turns a deterministic sales analysis into a stocking
//! recommendation by making exactly one call to an external reasoning engine:
//! - Builds the engine context from analyzer output (`reasoning`, `prompt`)
//! - Talks to hosted or local language models over HTTP (`llm`, `providers`)
//! - Validates whatever comes back before the caller sees it (`guardrails`)
//! - Drives the whole request through the suggestion flow (`orchestrator`)
//!
//! # Safety Principle
//!
//! The engine only proposes numbers and prose. Sales statistics are always
//! computed locally, and an engine reply that breaks the response contract is
//! rejected rather than repaired.

pub mod guardrails;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod providers;
pub mod reasoning;

pub use orchestrator::{SuggestionOrchestrator, SuggestionRun};
pub use reasoning::{LlmReasoningEngine, ReasoningContext, ReasoningEngine, ReasoningError};
