//! Error types for the assistance pipeline.

use surveyassist_core::ProviderError;

use crate::validation::ValidationFailure;

/// Errors surfaced by the pipeline to its callers.
///
/// Evaluation never returns these: every failure there degrades to a
/// fallback verdict. Only introduction initiation and request validation
/// can fail.
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

pub type Result<T> = std::result::Result<T, AssistError>;
