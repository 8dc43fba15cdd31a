//! # SurveyAssist Core
//!
//! Domain types for the SurveyAssist answer evaluation pipeline: survey
//! questions, assistance settings, verdicts, chat messages, and the
//! [`Provider`] trait every language model backend implements.
//!
//! Implementations live in `surveyassist-providers`; tests use stub providers.

pub mod assistance;
pub mod error;
pub mod message;
pub mod provider;
pub mod survey;
pub mod verdict;

// Re-export key types at crate root for ergonomics
pub use assistance::{
    AssistanceConfig, AssistanceKind, AssistanceTriggers, PartialAssistanceConfig,
    PartialAssistanceTriggers,
};
pub use error::ProviderError;
pub use message::{Message, Role};
pub use provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, ResponseFormat, StreamChunk, Usage,
};
pub use survey::{Question, QuestionType, SurveyCategory, SurveyContext};
pub use verdict::{EvaluationVerdict, ReasoningType, VerdictAssistance};
