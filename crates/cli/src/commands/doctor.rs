//! `surveyassist doctor`: diagnose configuration and provider health.

use std::path::Path;

use anyhow::bail;
use surveyassist_config::AppConfig;
use surveyassist_core::Provider;
use surveyassist_providers::ProviderRouter;

pub async fn run(config_path: Option<&Path>, online: bool) -> anyhow::Result<()> {
    println!("🩺 SurveyAssist Doctor");
    println!("=====================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `surveyassist config --init`)");
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e:#}");
            bail!("config is invalid");
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key: set SURVEYASSIST_API_KEY or OPENAI_API_KEY");
        issues += 1;
    }

    println!(
        "  ℹ️  Provider {} · evaluation model {} · introduction model {}",
        config.default_provider, config.evaluation.model, config.introduction.model
    );

    let router = ProviderRouter::from_config(&config);
    println!("  ℹ️  Providers registered: {}", router.names().join(", "));

    match router.default_provider() {
        Ok(provider) if online => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider {} reachable", provider.name()),
            Ok(false) => {
                println!("  ❌ Provider {} rejected the health check", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider {} unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        Ok(provider) => println!("  ✅ Provider {} configured (use --online to probe it)", provider.name()),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
        Ok(())
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
        bail!("doctor found {issues} issue(s)");
    }
}
