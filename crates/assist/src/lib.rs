//! # SurveyAssist Assist
//!
//! The answer assistance pipeline:
//!
//! - [`validation`] turns raw request bodies into typed requests or a list
//!   of field issues
//! - [`format`] and [`prompt`] render an answer and its context into a
//!   bounded evaluation prompt
//! - [`AssistanceEvaluator`] decides whether an answer needs a follow-up
//! - [`QuestionIntroducer`] streams a conversational lead-in for a question
//!
//! Both operations are stateless. All state a request needs, including how
//! many times assistance was already offered, arrives with the request.

pub mod error;
pub mod evaluator;
pub mod format;
pub mod introducer;
pub mod prompt;
pub mod request;
pub mod sanitize;
pub mod validation;

pub use error::{AssistError, Result};
pub use evaluator::{AssistanceEvaluator, Evaluation, EvaluationOutcome};
pub use format::format_answer;
pub use introducer::{QuestionIntroducer, TokenStream};
pub use prompt::{PromptInput, compose_evaluation_prompt};
pub use request::{CurrentQuestion, EvaluationRequest, IntroductionRequest};
pub use sanitize::sanitize;
pub use validation::{FieldIssue, ValidationFailure, validate_evaluation, validate_introduction};
