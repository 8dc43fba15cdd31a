pub mod config_cmd;
pub mod doctor;
pub mod evaluate;
pub mod introduce;
pub mod serve;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use surveyassist_config::AppConfig;
use surveyassist_core::Provider;
use tracing::debug;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return AppConfig::load().context("Failed to load config");
    };

    let mut config = AppConfig::load_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate().context("Invalid config")?;
    debug!(path = %path.display(), provider = %config.default_provider, "Loaded config");
    Ok(config)
}

/// The configured default provider.
pub fn default_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn Provider>> {
    surveyassist_providers::ProviderRouter::from_config(config)
        .default_provider()
        .with_context(|| format!("Cannot use provider '{}'", config.default_provider))
}

/// Read a request body from a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut body = Vec::new();
        std::io::stdin()
            .read_to_end(&mut body)
            .context("Failed to read stdin")?;
        return Ok(body);
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Print validation issues to stderr.
pub fn report_issues(failure: &surveyassist_assist::ValidationFailure) {
    eprintln!("❌ Invalid request:");
    for issue in &failure.issues {
        eprintln!("   {}: {}", issue.path, issue.message);
    }
}
