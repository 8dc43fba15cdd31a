//! `surveyassist introduce`: stream an introduction to stdout.

use std::io::Write;
use std::path::Path;

use anyhow::bail;
use futures::StreamExt;
use surveyassist_assist::{QuestionIntroducer, validate_introduction};

pub async fn run(config_path: Option<&Path>, file: &Path) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let body = super::read_input(file)?;

    let request = match validate_introduction(&body, &config.introduction.allowed_models) {
        Ok(request) => request,
        Err(failure) => {
            super::report_issues(&failure);
            bail!("{failure}");
        }
    };

    let introducer = QuestionIntroducer::new(super::default_provider(&config)?, config.introduction);
    let mut tokens = introducer.stream_introduction(&request).await?;

    let mut stdout = std::io::stdout();
    while let Some(token) = tokens.next().await {
        match token {
            Ok(text) => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            Err(e) => {
                writeln!(stdout)?;
                bail!("Introduction interrupted: {e}");
            }
        }
    }
    writeln!(stdout)?;
    Ok(())
}
