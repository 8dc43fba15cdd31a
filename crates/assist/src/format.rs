//! Answer formatting: turns a raw answer value of any question shape into a
//! short human-readable string for the evaluation prompt.

use serde_json::Value;
use surveyassist_core::QuestionType;

/// Returned for null or empty answers.
pub const NO_ANSWER: &str = "No answer provided";
/// Placeholder for an uploaded item without a comment.
pub const NO_COMMENT: &str = "(no comment)";
/// Cap on the serialized form of answers with an unrecognized shape.
pub const SERIALIZED_LIMIT: usize = 200;
/// Hard cap on any formatted answer.
pub const ANSWER_LIMIT: usize = 1000;

/// Format `answer` for a question of type `question_type`.
///
/// Never fails: answers that do not match the expected shape fall back to a
/// truncated JSON rendering.
pub fn format_answer(answer: &Value, question_type: QuestionType) -> String {
    if is_blank(answer) {
        return NO_ANSWER.to_string();
    }

    let formatted = match question_type {
        QuestionType::Input | QuestionType::Textarea => match answer {
            Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        },
        QuestionType::Number => scalar_text(answer).map(|n| format!("Numeric answer: {n}")),
        QuestionType::Select | QuestionType::Radio => choice_text(answer).map(|v| format!("Selected: {v}")),
        QuestionType::ImageUploadComment => match answer {
            Value::Array(items) => Some(format_uploads(items)),
            _ => None,
        },
        QuestionType::Range => scalar_text(answer).map(|r| format!("Rating: {r}")),
        QuestionType::VideoUpload => Some(video_presence(answer).to_string()),
        QuestionType::Other => None,
    };

    let formatted = formatted.unwrap_or_else(|| fallback(answer));
    truncate_chars(&formatted, ANSWER_LIMIT)
}

fn is_blank(answer: &Value) -> bool {
    match answer {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Text of a scalar answer; numbers may arrive as strings.
fn scalar_text(answer: &Value) -> Option<String> {
    match answer {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A single choice, or several choices joined with commas.
fn choice_text(answer: &Value) -> Option<String> {
    match answer {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (parts.len() == items.len()).then(|| parts.join(", "))
        }
        other => scalar_text(other),
    }
}

fn format_uploads(items: &[Value]) -> String {
    let comments: Vec<String> = items
        .iter()
        .map(|item| {
            item.get("comment")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(NO_COMMENT)
                .to_string()
        })
        .collect();

    let noun = if items.len() == 1 { "image" } else { "images" };
    format!(
        "{} {noun} uploaded. Comments: {}",
        items.len(),
        comments.join("; ")
    )
}

fn video_presence(answer: &Value) -> &'static str {
    match answer {
        Value::Bool(false) => "No video uploaded",
        _ => "Video uploaded",
    }
}

fn fallback(answer: &Value) -> String {
    let rendered = match answer {
        Value::String(s) => s.trim().to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };
    truncate_chars(&rendered, SERIALIZED_LIMIT)
}

/// Cut `s` to at most `max` characters, marking the cut with `...`.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
