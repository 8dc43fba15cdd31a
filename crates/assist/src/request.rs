//! Inbound request payloads for the two assistance operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use surveyassist_core::{Message, Question, QuestionType, SurveyContext};

/// Body of an answer evaluation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub question: Question,

    /// Raw answer; its shape depends on the question type.
    #[serde(default)]
    pub answer: Value,

    /// Earlier answers in the same survey, keyed by question id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_answers: Option<BTreeMap<String, Value>>,

    pub survey_context: SurveyContext,

    /// How many times assistance was already offered for this question.
    /// Tracked by the caller; the server keeps no state between requests.
    #[serde(default)]
    pub retry_count: u32,
}

/// The question being introduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuestion {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default)]
    pub is_first: bool,

    #[serde(default)]
    pub is_last: bool,

    /// Zero-based position of the question in the survey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

impl CurrentQuestion {
    /// `(position, total)` with a one-based position, when both are known.
    pub fn progress(&self) -> Option<(i64, i64)> {
        match (self.index, self.total) {
            (Some(index), Some(total)) if index >= 0 && total >= 0 => {
                Some((index.saturating_add(1), total))
            }
            _ => None,
        }
    }
}

/// Body of a question introduction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroductionRequest {
    /// Conversation so far, oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,

    pub current_question: CurrentQuestion,

    pub survey_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_description: Option<String>,

    /// Model override; must be one of the configured allowed models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
