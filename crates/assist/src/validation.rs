//! Request validation.
//!
//! Payloads are parsed from raw bytes so that malformed JSON and shape
//! errors are reported the same way as bound violations: as a list of
//! field issues.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::request::{EvaluationRequest, IntroductionRequest};

pub const MAX_QUESTION_TEXT_CHARS: usize = 5000;
pub const MAX_TITLE_CHARS: usize = 500;
pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const MAX_MESSAGES: usize = 50;
pub const MAX_PREVIOUS_ANSWERS: usize = 50;
pub const MAX_OPTIONS: usize = 100;
pub const MAX_CONFIGURED_RETRIES: u32 = 10;
pub const MAX_RETRY_COUNT: u32 = 100;

/// One offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Dotted path to the field, or `body` when the payload did not parse.
    pub path: String,
    pub message: String,
}

/// A rejected request with every issue found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("request validation failed with {} issue(s)", .issues.len())]
pub struct ValidationFailure {
    pub issues: Vec<FieldIssue>,
}

impl ValidationFailure {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                path: path.into(),
                message: message.into(),
            }],
        }
    }
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn required(&mut self, path: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(path, "must not be empty");
        }
    }

    fn max_chars(&mut self, path: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(path, format!("must be at most {max} characters"));
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationFailure> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationFailure { issues: self.0 })
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ValidationFailure> {
    serde_json::from_slice(body).map_err(|e| ValidationFailure::single("body", e.to_string()))
}

/// Parse and validate an evaluation request body.
pub fn validate_evaluation(body: &[u8]) -> Result<EvaluationRequest, ValidationFailure> {
    let request: EvaluationRequest = parse_body(body)?;
    let mut issues = Issues::default();

    let question = &request.question;
    issues.required("question.id", &question.id);
    issues.required("question.text", &question.text);
    issues.max_chars("question.text", &question.text, MAX_QUESTION_TEXT_CHARS);
    issues.required("surveyContext.title", &request.survey_context.title);
    issues.max_chars("surveyContext.title", &request.survey_context.title, MAX_TITLE_CHARS);

    if let Some(config) = &question.assistance_config {
        if config.max_retries.is_some_and(|m| m > MAX_CONFIGURED_RETRIES) {
            issues.push(
                "question.assistanceConfig.maxRetries",
                format!("must be at most {MAX_CONFIGURED_RETRIES}"),
            );
        }
        if config
            .confidence_threshold
            .is_some_and(|t| !(0.0..=1.0).contains(&t))
        {
            issues.push(
                "question.assistanceConfig.confidenceThreshold",
                "must be between 0 and 1",
            );
        }
    }

    if request
        .previous_answers
        .as_ref()
        .is_some_and(|p| p.len() > MAX_PREVIOUS_ANSWERS)
    {
        issues.push(
            "previousAnswers",
            format!("must contain at most {MAX_PREVIOUS_ANSWERS} entries"),
        );
    }

    if request.retry_count > MAX_RETRY_COUNT {
        issues.push("retryCount", format!("must be at most {MAX_RETRY_COUNT}"));
    }

    issues.finish(request)
}

/// Parse and validate an introduction request body.
pub fn validate_introduction(
    body: &[u8],
    allowed_models: &[String],
) -> Result<IntroductionRequest, ValidationFailure> {
    let request: IntroductionRequest = parse_body(body)?;
    let mut issues = Issues::default();

    if request.messages.len() > MAX_MESSAGES {
        issues.push("messages", format!("must contain at most {MAX_MESSAGES} messages"));
    }
    for (i, message) in request.messages.iter().enumerate() {
        issues.max_chars(&format!("messages[{i}].content"), &message.content, MAX_MESSAGE_CHARS);
    }

    let question = &request.current_question;
    issues.required("currentQuestion.text", &question.text);
    issues.max_chars("currentQuestion.text", &question.text, MAX_QUESTION_TEXT_CHARS);
    if question.options.as_ref().is_some_and(|o| o.len() > MAX_OPTIONS) {
        issues.push(
            "currentQuestion.options",
            format!("must contain at most {MAX_OPTIONS} options"),
        );
    }

    issues.required("surveyTitle", &request.survey_title);
    issues.max_chars("surveyTitle", &request.survey_title, MAX_TITLE_CHARS);

    if let Some(model) = &request.model
        && !allowed_models.contains(model)
    {
        issues.push("model", format!("must be one of: {}", allowed_models.join(", ")));
    }

    issues.finish(request)
}
