//! Provider selection for SurveyAssist.
//!
//! Every configured provider speaks the OpenAI chat-completions protocol.
//! Well-known provider names get their public endpoint when no `api_url`
//! is configured; any other name needs an explicit URL.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::openai_compat::OpenAiCompatProvider;
use surveyassist_config::AppConfig;
use surveyassist_core::{Provider, ProviderError};

/// Public endpoints for providers that need no `api_url`.
const KNOWN_ENDPOINTS: &[(&str, &str)] = &[
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("together", "https://api.together.xyz/v1"),
    ("fireworks", "https://api.fireworks.ai/inference/v1"),
    ("ollama", "http://localhost:11434/v1"),
    ("vllm", "http://localhost:8000/v1"),
];

/// Configured providers by name, plus which one serves requests.
pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Build every provider the config names. The default provider is
    /// always attempted, even without a `[providers.<name>]` table.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut providers: BTreeMap<String, Arc<dyn Provider>> = BTreeMap::new();

        let mut names: Vec<&String> = config.providers.keys().collect();
        if !config.providers.contains_key(&config.default_provider) {
            names.push(&config.default_provider);
        }

        for name in names {
            let entry = config.providers.get(name);
            let Some(base_url) = entry
                .and_then(|p| p.api_url.clone())
                .or_else(|| known_endpoint(name).map(str::to_string))
            else {
                warn!(provider = %name, "Skipping provider with no api_url");
                continue;
            };
            let api_key = entry
                .and_then(|p| p.api_key.clone())
                .or_else(|| config.api_key.clone())
                .unwrap_or_default();

            debug!(provider = %name, base_url = %base_url, "Registered provider");
            providers.insert(
                name.clone(),
                Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)),
            );
        }

        Self {
            providers,
            default_provider: config.default_provider.clone(),
        }
    }

    /// The provider both pipelines run on.
    pub fn default_provider(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        self.get(&self.default_provider).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "provider '{}' has no api_url and is not a known provider",
                self.default_provider
            ))
        })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

fn known_endpoint(name: &str) -> Option<&'static str> {
    KNOWN_ENDPOINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, url)| *url)
}
