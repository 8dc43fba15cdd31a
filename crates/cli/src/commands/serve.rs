//! `surveyassist serve`: start the HTTP gateway.

use std::path::Path;

use anyhow::anyhow;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("📋 SurveyAssist Gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:   {}", config.default_provider);
    println!("   Evaluation: {}", config.evaluation.model);
    println!("   Error details exposed: {}", config.gateway.expose_error_details);

    surveyassist_gateway::start(config)
        .await
        .map_err(|e| anyhow!("Gateway failed: {e}"))
}
