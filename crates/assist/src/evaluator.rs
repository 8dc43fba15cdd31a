//! Assistance evaluator: decides whether an answer needs a follow-up.
//!
//! One evaluation is a small state machine:
//!
//! ```text
//! merge config ─┬─ disabled ─────────────────────────────▶ Disabled
//!               ├─ retryCount >= maxRetries ─────────────▶ RetriesExhausted
//!               └─ model call ─┬─ error / timeout / bad JSON ▶ Fallback
//!                              ├─ confidence < threshold ──▶ ConfidenceGated
//!                              └─ otherwise ───────────────▶ ModelVerdict
//! ```
//!
//! Every path ends in a verdict. Failures never propagate to the caller:
//! they degrade to "proceed without assistance".

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use surveyassist_config::EvaluationConfig;
use surveyassist_core::{
    AssistanceConfig, EvaluationVerdict, Message, Provider, ProviderError, ProviderRequest,
    ReasoningType, ResponseFormat, VerdictAssistance,
};
use tracing::{debug, info, warn};

use crate::format::format_answer;
use crate::prompt::{PromptInput, compose_evaluation_prompt};
use crate::request::EvaluationRequest;

/// Feedback once the respondent has used up their assistance rounds.
pub const EXHAUSTED_FEEDBACK: &str = "Thank you for your answer! Let's move on to the next question.";
/// Feedback replacing a verdict the model was not confident about.
pub const LOW_CONFIDENCE_FEEDBACK: &str = "Thanks for your answer!";
/// Feedback when the model could not produce a usable verdict.
pub const FALLBACK_FEEDBACK: &str = "Thank you for your response. Let's continue.";
/// Feedback when assistance is switched off for the question.
pub const DISABLED_FEEDBACK: &str = "Thank you for your answer.";
/// Prepended to assistance feedback that does not open on a positive note.
pub const ENCOURAGING_PREFIX: &str = "Thanks for sharing!";

const DEFAULT_FOLLOW_UP: &str = "Could you tell us a little more?";
const FALLBACK_CONFIDENCE: f32 = 0.5;

const POSITIVE_MARKERS: &[&str] = &[
    "thank",
    "great",
    "good",
    "nice",
    "appreciate",
    "helpful",
    "interesting",
    "love",
    "wonderful",
    "excellent",
    "glad",
];

/// How an evaluation reached its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Assistance is switched off for the question.
    Disabled,
    /// `retryCount >= maxRetries`; the model was not consulted.
    RetriesExhausted,
    /// The model answered below the confidence threshold.
    ConfidenceGated,
    /// The model's verdict, after the tone guarantee.
    ModelVerdict,
    /// The model call failed, timed out, or returned an unusable verdict.
    Fallback,
}

impl EvaluationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::RetriesExhausted => "retries_exhausted",
            Self::ConfidenceGated => "confidence_gated",
            Self::ModelVerdict => "model_verdict",
            Self::Fallback => "fallback",
        }
    }

    /// Whether the model was called to reach this outcome.
    pub fn consulted_model(&self) -> bool {
        matches!(self, Self::ConfidenceGated | Self::ModelVerdict | Self::Fallback)
    }
}

/// A verdict together with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: EvaluationVerdict,
    pub outcome: EvaluationOutcome,
}

impl Evaluation {
    fn new(verdict: EvaluationVerdict, outcome: EvaluationOutcome) -> Self {
        Self { verdict, outcome }
    }
}

/// Shape the model is asked to return. Only the decision fields are
/// required; the rest get defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    needs_assistance: bool,
    confidence: f32,
    reasoning_type: ReasoningType,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    suggestions: Option<Vec<String>>,
    #[serde(default)]
    assistance_type: Option<VerdictAssistance>,
}

/// Evaluates survey answers against a language model.
pub struct AssistanceEvaluator {
    provider: Arc<dyn Provider>,
    config: EvaluationConfig,
}

impl AssistanceEvaluator {
    pub fn new(provider: Arc<dyn Provider>, config: EvaluationConfig) -> Self {
        Self { provider, config }
    }

    /// Evaluate one answer. Makes at most one model call and never fails.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Evaluation {
        let question_id = request.question.id.as_str();
        let config = AssistanceConfig::resolve(request.question.assistance_config.as_ref());

        let evaluation = if !config.enabled {
            Evaluation::new(
                EvaluationVerdict::proceed(1.0, DISABLED_FEEDBACK),
                EvaluationOutcome::Disabled,
            )
        } else if request.retry_count >= config.max_retries {
            Evaluation::new(
                EvaluationVerdict::proceed(1.0, EXHAUSTED_FEEDBACK),
                EvaluationOutcome::RetriesExhausted,
            )
        } else {
            match self.consult_model(request, &config).await {
                Ok(verdict) => apply_policy(verdict, &config),
                Err(e) => {
                    warn!(
                        question_id,
                        provider = self.provider.name(),
                        kind = e.kind(),
                        error = %e,
                        "Evaluation failed, proceeding without assistance"
                    );
                    Evaluation::new(
                        EvaluationVerdict::proceed(FALLBACK_CONFIDENCE, FALLBACK_FEEDBACK),
                        EvaluationOutcome::Fallback,
                    )
                }
            }
        };

        info!(
            question_id,
            outcome = evaluation.outcome.as_str(),
            model_called = evaluation.outcome.consulted_model(),
            retry_count = request.retry_count,
            needs_assistance = evaluation.verdict.needs_assistance,
            confidence = evaluation.verdict.confidence,
            "Evaluation complete"
        );
        evaluation
    }

    async fn consult_model(
        &self,
        request: &EvaluationRequest,
        config: &AssistanceConfig,
    ) -> Result<EvaluationVerdict, ProviderError> {
        let formatted = format_answer(&request.answer, request.question.question_type);
        let prompt = compose_evaluation_prompt(&PromptInput {
            question: &request.question,
            config,
            survey: &request.survey_context,
            formatted_answer: &formatted,
            retry_count: request.retry_count,
            previous_answers: request.previous_answers.as_ref(),
            language: &self.config.output_language,
        });
        debug!(prompt_chars = prompt.chars().count(), "Composed evaluation prompt");

        let provider_request = ProviderRequest::new(&self.config.model, vec![Message::user(prompt)])
            .with_temperature(self.config.temperature)
            .with_response_format(ResponseFormat {
                name: "evaluation_verdict".into(),
                schema: verdict_schema(),
            });

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let response = tokio::time::timeout(timeout, self.provider.complete(provider_request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "evaluation timed out after {}s",
                    timeout.as_secs()
                ))
            })??;

        parse_verdict(&response.message.content)
    }
}

/// Parse the model's JSON into a verdict, filling optional fields.
fn parse_verdict(content: &str) -> Result<EvaluationVerdict, ProviderError> {
    let raw: RawVerdict = serde_json::from_str(content.trim()).map_err(|e| {
        ProviderError::InvalidResponse(format!("verdict does not match schema: {e}"))
    })?;

    if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
        return Err(ProviderError::InvalidResponse(format!(
            "confidence {} outside [0, 1]",
            raw.confidence
        )));
    }

    let feedback = raw
        .feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| {
            if raw.needs_assistance {
                DEFAULT_FOLLOW_UP.to_string()
            } else {
                LOW_CONFIDENCE_FEEDBACK.to_string()
            }
        });

    let suggestions = raw
        .suggestions
        .map(|s| {
            s.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty());

    // The kind must agree with the decision; a missing or contradictory kind
    // is replaced.
    let assistance_type = match (raw.needs_assistance, raw.assistance_type) {
        (false, _) => VerdictAssistance::None,
        (true, None | Some(VerdictAssistance::None)) => VerdictAssistance::Clarification,
        (true, Some(kind)) => kind,
    };

    Ok(EvaluationVerdict {
        needs_assistance: raw.needs_assistance,
        confidence: raw.confidence,
        feedback,
        suggestions,
        assistance_type,
        reasoning_type: raw.reasoning_type,
    })
}

/// Confidence gate, then tone guarantee.
fn apply_policy(mut verdict: EvaluationVerdict, config: &AssistanceConfig) -> Evaluation {
    if verdict.confidence < config.confidence_threshold {
        verdict.needs_assistance = false;
        verdict.assistance_type = VerdictAssistance::None;
        verdict.suggestions = None;
        verdict.feedback = LOW_CONFIDENCE_FEEDBACK.to_string();
        return Evaluation::new(verdict, EvaluationOutcome::ConfidenceGated);
    }

    if verdict.needs_assistance && !has_positive_marker(&verdict.feedback) {
        verdict.feedback = format!("{ENCOURAGING_PREFIX} {}", verdict.feedback);
    }
    Evaluation::new(verdict, EvaluationOutcome::ModelVerdict)
}

/// Whether the opening sentence contains a positive word that is not
/// negated ("Great start!" counts, "Not good enough." does not).
fn has_positive_marker(feedback: &str) -> bool {
    let lower = feedback.to_lowercase();
    let opening = lower.split(['.', '!', '?', ';']).next().unwrap_or("");
    let words: Vec<&str> = opening
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    words.iter().enumerate().any(|(i, word)| {
        POSITIVE_MARKERS.iter().any(|m| word.starts_with(m))
            && !(i > 0 && is_negation(words[i - 1]))
    })
}

fn is_negation(word: &str) -> bool {
    matches!(word, "not" | "no" | "never") || word.ends_with("n't")
}

/// Strict JSON schema for the verdict, sent as the response format.
pub fn verdict_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "needsAssistance": {"type": "boolean"},
            "confidence": {"type": "number", "minimum": 0, "maximum": 1},
            "feedback": {"type": "string"},
            "suggestions": {
                "type": ["array", "null"],
                "items": {"type": "string"}
            },
            "assistanceType": {
                "type": "string",
                "enum": ["clarification", "validation", "enhancement", "none"]
            },
            "reasoningType": {
                "type": "string",
                "enum": ["too_short", "missing_detail", "unclear", "inconsistent", "satisfactory"]
            }
        },
        "required": [
            "needsAssistance",
            "confidence",
            "feedback",
            "suggestions",
            "assistanceType",
            "reasoningType"
        ],
        "additionalProperties": false
    })
}
