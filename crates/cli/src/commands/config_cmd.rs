//! `surveyassist config`: show the effective configuration or write the
//! default file.

use std::path::Path;

use anyhow::{Context, bail};
use surveyassist_config::AppConfig;

pub fn run(config_path: Option<&Path>, init: bool, force: bool) -> anyhow::Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    if init {
        write_default(&path, force)?;
        println!("✅ Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = super::load_config(config_path)?;
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&config.redacted())?);
    Ok(())
}

fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(path, AppConfig::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))
}
