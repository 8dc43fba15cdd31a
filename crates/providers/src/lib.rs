//! LLM Provider implementations for SurveyAssist.
//!
//! Providers implement the `surveyassist_core::Provider` trait;
//! [`ProviderRouter`] builds them from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
