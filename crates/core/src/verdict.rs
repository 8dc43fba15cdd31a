//! The structured output of one evaluation cycle.

use serde::{Deserialize, Serialize};

/// The kind of assistance a verdict asks the respondent for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictAssistance {
    Clarification,
    Validation,
    Enhancement,
    None,
}

/// Why the evaluator reached its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningType {
    TooShort,
    MissingDetail,
    Unclear,
    Inconsistent,
    Satisfactory,
}

/// Whether a respondent's answer warrants clarification.
///
/// `feedback` is always end-user-facing text in the configured language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationVerdict {
    pub needs_assistance: bool,
    pub confidence: f32,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    pub assistance_type: VerdictAssistance,
    pub reasoning_type: ReasoningType,
}

impl EvaluationVerdict {
    /// A verdict that lets the respondent continue without assistance.
    pub fn proceed(confidence: f32, feedback: impl Into<String>) -> Self {
        Self {
            needs_assistance: false,
            confidence,
            feedback: feedback.into(),
            suggestions: None,
            assistance_type: VerdictAssistance::None,
            reasoning_type: ReasoningType::Satisfactory,
        }
    }
}
