//! Evaluation prompt composition.
//!
//! The prompt is an ordered list of optional segments; absent segments are
//! filtered out and the rest joined. Every caller-supplied string passes
//! through [`sanitize`] before interpolation, so the output is bounded and
//! reproducible from its inputs.

use std::collections::BTreeMap;

use serde_json::Value;
use surveyassist_core::{AssistanceConfig, AssistanceKind, Question, QuestionType, SurveyContext};

use crate::format::format_answer;
use crate::sanitize::{FIELD_LIMIT, QUESTION_TEXT_LIMIT, sanitize};

/// Previous answers included when checking for inconsistencies.
pub const MAX_PREVIOUS_ANSWERS: usize = 10;
const PREVIOUS_KEY_LIMIT: usize = 100;
const LANGUAGE_LIMIT: usize = 40;

/// Everything the evaluation prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub question: &'a Question,
    pub config: &'a AssistanceConfig,
    pub survey: &'a SurveyContext,
    /// Output of [`format_answer`] for the answer under evaluation.
    pub formatted_answer: &'a str,
    pub retry_count: u32,
    pub previous_answers: Option<&'a BTreeMap<String, Value>>,
    pub language: &'a str,
}

const ROLE_LINE: &str = "You are reviewing a respondent's answer in a consumer survey and deciding \
whether they should be gently invited to clarify or expand it before moving on.";

const STATIC_GUIDELINES: &[&str] = &[
    "Set needsAssistance to true only when a follow-up would clearly improve the answer. Accept reasonable answers as they are.",
    "Never criticize the respondent. When asking for more, first acknowledge the answer warmly, then ask one concise follow-up.",
    "Unclear answers: flag answers whose meaning cannot be determined (reasoningType \"unclear\").",
    "Do not ask for personal, financial or otherwise sensitive information.",
    "When no assistance is needed use assistanceType \"none\" and reasoningType \"satisfactory\".",
    "Report confidence as a number between 0 and 1 describing how sure you are of this verdict.",
];

/// Compose the evaluation prompt. Pure: no I/O, same input gives same output.
pub fn compose_evaluation_prompt(input: &PromptInput<'_>) -> String {
    let segments = [
        Some(ROLE_LINE.to_string()),
        Some(context_block(input)),
        Some(question_block(input.question)),
        Some(format!(
            "## Answer under evaluation\nAnswer: \"{}\"",
            sanitize(input.formatted_answer, FIELD_LIMIT)
        )),
        Some(attempt_block(input.retry_count, input.config.max_retries)),
        custom_instruction_block(input.config),
        Some(guidelines_block(input.config)),
        Some(format!(
            "## Output language\nWrite feedback and every suggestion in {}, addressed directly to the respondent.",
            sanitize(input.language, LANGUAGE_LIMIT)
        )),
    ];

    segments.into_iter().flatten().collect::<Vec<_>>().join("\n\n")
}

fn context_block(input: &PromptInput<'_>) -> String {
    let survey = input.survey;
    let lines = [
        Some("## Survey context".to_string()),
        Some(format!("Survey: \"{}\"", sanitize(&survey.title, FIELD_LIMIT))),
        survey.current_category.as_ref().map(|c| {
            format!("Category: \"{}\"", sanitize(&c.name, FIELD_LIMIT))
        }),
        survey
            .current_category
            .as_ref()
            .and_then(|c| c.description.as_deref())
            .map(|d| format!("Category description: \"{}\"", sanitize(d, FIELD_LIMIT))),
        previous_answers_block(input),
    ];

    lines.into_iter().flatten().collect::<Vec<_>>().join("\n")
}

/// Only rendered when inconsistencies are being checked.
fn previous_answers_block(input: &PromptInput<'_>) -> Option<String> {
    if !input.config.triggers.inconsistent_data {
        return None;
    }
    let answers = input.previous_answers.filter(|a| !a.is_empty())?;

    let mut block = String::from("Previous answers in this survey:");
    for (question_id, answer) in answers.iter().take(MAX_PREVIOUS_ANSWERS) {
        block.push_str(&format!(
            "\n- \"{}\": \"{}\"",
            sanitize(question_id, PREVIOUS_KEY_LIMIT),
            sanitize(&format_answer(answer, QuestionType::Other), FIELD_LIMIT)
        ));
    }
    Some(block)
}

fn question_block(question: &Question) -> String {
    format!(
        "## Question\nQuestion: \"{}\"\nQuestion type: {}",
        sanitize(&question.text, QUESTION_TEXT_LIMIT),
        question.question_type
    )
}

fn attempt_block(retry_count: u32, max_retries: u32) -> String {
    let mut block = format!(
        "## Attempt\nThis is assistance round {} (at most {} allowed).",
        retry_count.saturating_add(1),
        max_retries
    );
    if retry_count > 0 {
        block.push_str(&format!(
            " The respondent has already been asked to clarify {retry_count} time(s). \
Only ask again if the answer is still clearly insufficient."
        ));
    }
    block
}

fn custom_instruction_block(config: &AssistanceConfig) -> Option<String> {
    config
        .custom_prompt
        .as_deref()
        .map(|p| format!("## Additional instructions\n\"{}\"", sanitize(p, FIELD_LIMIT)))
}

fn guidelines_block(config: &AssistanceConfig) -> String {
    let mut lines: Vec<String> = vec!["## Evaluation guidelines".to_string()];
    lines.extend(STATIC_GUIDELINES.iter().map(|g| format!("- {g}")));

    if config.assistance_type != AssistanceKind::All {
        let kind = config.assistance_type.as_str();
        lines.push(format!(
            "- Only offer {kind} assistance: use assistanceType \"{kind}\" or \"none\"."
        ));
    }

    let triggers = config.triggers;
    if triggers.short_answers {
        lines.push(
            "- Short answers: flag answers too brief to be useful for this question (reasoningType \"too_short\")."
                .to_string(),
        );
    }
    if triggers.incomplete_data {
        lines.push(
            "- Incomplete data: flag answers that leave out details the question explicitly asks for (reasoningType \"missing_detail\")."
                .to_string(),
        );
    }
    if triggers.inconsistent_data {
        lines.push(
            "- Inconsistent data: flag answers that contradict themselves or the previous answers (reasoningType \"inconsistent\")."
                .to_string(),
        );
    }

    lines.join("\n")
}
