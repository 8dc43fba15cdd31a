//! Per-question assistance configuration.
//!
//! Questions carry an optional [`PartialAssistanceConfig`]. The effective
//! [`AssistanceConfig`] is the defaults with every field that the partial
//! sets replaced by the partial's value. `triggers` merges field by field, so
//! overriding one trigger keeps the other defaults.

use serde::{Deserialize, Serialize};

/// Which kind of assistance a question is configured to offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistanceKind {
    #[default]
    All,
    Clarification,
    Validation,
    Enhancement,
}

impl AssistanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistanceKind::All => "all",
            AssistanceKind::Clarification => "clarification",
            AssistanceKind::Validation => "validation",
            AssistanceKind::Enhancement => "enhancement",
        }
    }
}

/// Which answer problems the evaluator should look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistanceTriggers {
    pub short_answers: bool,
    pub incomplete_data: bool,
    pub inconsistent_data: bool,
}

impl Default for AssistanceTriggers {
    fn default() -> Self {
        Self {
            short_answers: true,
            incomplete_data: true,
            inconsistent_data: false,
        }
    }
}

/// Effective assistance settings for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistanceConfig {
    pub enabled: bool,
    pub assistance_type: AssistanceKind,
    pub max_retries: u32,
    /// Minimum model confidence for a verdict to be acted on, in `[0, 1]`.
    pub confidence_threshold: f32,
    pub triggers: AssistanceTriggers,
    /// Free-text instruction appended to the evaluation prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

impl Default for AssistanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            assistance_type: AssistanceKind::All,
            max_retries: DEFAULT_MAX_RETRIES,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            triggers: AssistanceTriggers::default(),
            custom_prompt: None,
        }
    }
}

/// Caller-supplied overrides; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialAssistanceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistance_type: Option<AssistanceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<PartialAssistanceTriggers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialAssistanceTriggers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_answers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_data: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inconsistent_data: Option<bool>,
}

impl AssistanceTriggers {
    /// Apply the fields set in `partial` over `self`.
    pub fn merge(self, partial: &PartialAssistanceTriggers) -> Self {
        Self {
            short_answers: partial.short_answers.unwrap_or(self.short_answers),
            incomplete_data: partial.incomplete_data.unwrap_or(self.incomplete_data),
            inconsistent_data: partial.inconsistent_data.unwrap_or(self.inconsistent_data),
        }
    }
}

impl AssistanceConfig {
    /// Apply the fields set in `partial` over `self`.
    ///
    /// A non-finite threshold is ignored; a finite one is clamped to `[0, 1]`.
    /// A blank custom prompt counts as unset.
    pub fn merge(self, partial: &PartialAssistanceConfig) -> Self {
        let confidence_threshold = partial
            .confidence_threshold
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, 1.0))
            .unwrap_or(self.confidence_threshold);

        let custom_prompt = match partial.custom_prompt.as_deref() {
            Some(p) if !p.trim().is_empty() => Some(p.to_string()),
            Some(_) => None,
            None => self.custom_prompt,
        };

        Self {
            enabled: partial.enabled.unwrap_or(self.enabled),
            assistance_type: partial.assistance_type.unwrap_or(self.assistance_type),
            max_retries: partial.max_retries.unwrap_or(self.max_retries),
            confidence_threshold,
            triggers: match &partial.triggers {
                Some(t) => self.triggers.merge(t),
                None => self.triggers,
            },
            custom_prompt,
        }
    }

    /// Resolve the effective config for a question from its optional overrides.
    pub fn resolve(partial: Option<&PartialAssistanceConfig>) -> Self {
        match partial {
            Some(p) => Self::default().merge(p),
            None => Self::default(),
        }
    }
}
