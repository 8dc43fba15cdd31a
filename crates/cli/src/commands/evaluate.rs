//! `surveyassist evaluate`: run one evaluation and print the verdict.

use std::path::Path;

use anyhow::bail;
use surveyassist_assist::{AssistanceEvaluator, validate_evaluation};

pub async fn run(config_path: Option<&Path>, file: &Path) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let body = super::read_input(file)?;

    let request = match validate_evaluation(&body) {
        Ok(request) => request,
        Err(failure) => {
            super::report_issues(&failure);
            bail!("{failure}");
        }
    };

    let evaluator = AssistanceEvaluator::new(super::default_provider(&config)?, config.evaluation);
    let evaluation = evaluator.evaluate(&request).await;

    eprintln!("outcome: {}", evaluation.outcome.as_str());
    println!("{}", serde_json::to_string_pretty(&evaluation.verdict)?);
    Ok(())
}
