//! Survey-side domain types: questions and the read-only survey context
//! injected into prompts.

use serde::{Deserialize, Serialize};

use crate::assistance::PartialAssistanceConfig;

/// The kind of input a question collects. Unknown kinds map to `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Input,
    Textarea,
    Number,
    Select,
    Radio,
    ImageUploadComment,
    Range,
    VideoUpload,
    #[serde(other)]
    Other,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Input => "input",
            QuestionType::Textarea => "textarea",
            QuestionType::Number => "number",
            QuestionType::Select => "select",
            QuestionType::Radio => "radio",
            QuestionType::ImageUploadComment => "image_upload_comment",
            QuestionType::Range => "range",
            QuestionType::VideoUpload => "video_upload",
            QuestionType::Other => "other",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A survey question as submitted with an evaluation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(rename = "type", default)]
    pub question_type: QuestionType,

    /// Per-question assistance overrides, merged over the defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistance_config: Option<PartialAssistanceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// The category the current question belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCategory {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Read-only survey context injected into prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyContext {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_category: Option<SurveyCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_parses_camel_case() {
        let q: Question = serde_json::from_value(serde_json::json!({
            "id": "q1",
            "text": "What do you like about the product?",
            "type": "image_upload_comment",
            "assistanceConfig": { "maxRetries": 3 },
            "categoryId": "cat-1"
        }))
        .unwrap();
        assert_eq!(q.question_type, QuestionType::ImageUploadComment);
        assert_eq!(q.assistance_config.unwrap().max_retries, Some(3));
        assert_eq!(q.category_id.as_deref(), Some("cat-1"));
    }

    #[test]
    fn unknown_question_type_maps_to_other() {
        let q: Question = serde_json::from_value(serde_json::json!({
            "id": "q1",
            "text": "Pick a date",
            "type": "date_picker"
        }))
        .unwrap();
        assert_eq!(q.question_type, QuestionType::Other);
    }

    #[test]
    fn survey_context_optional_fields() {
        let ctx: SurveyContext = serde_json::from_value(serde_json::json!({
            "title": "Coffee habits",
            "currentCategory": { "name": "Morning routine" }
        }))
        .unwrap();
        assert!(ctx.description.is_none());
        assert_eq!(ctx.current_category.unwrap().name, "Morning routine");
    }

    #[test]
    fn question_type_displays_wire_name() {
        assert_eq!(QuestionType::ImageUploadComment.to_string(), "image_upload_comment");
        assert_eq!(QuestionType::VideoUpload.to_string(), "video_upload");
    }
}
