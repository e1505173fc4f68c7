use anyhow::{bail, Result};
use colored::Colorize;
use formflow::{AlertKind, FormflowConfig, SubmitOutcome};
use std::path::Path;

use super::Fill;

pub fn execute(
    page: &Path,
    config: FormflowConfig,
    fill: &Fill,
    base_url: Option<String>,
) -> Result<()> {
    let base_url = base_url.or_else(|| config.submission.base_url.clone());

    println!("{}", format!("Submitting form '{}'...", fill.form).green().bold());
    println!();

    let (outcome, alerts) = super::runtime()?.block_on(async {
        let pipeline = super::load_pipeline(page, config, base_url.as_deref()).await?;
        let mut receiver = pipeline.subscribe();
        super::apply(&pipeline, fill).await?;

        let outcome = pipeline.submit(&fill.form).await?;

        let mut alerts = Vec::new();
        while let Ok(alert) = receiver.try_recv() {
            alerts.push(alert);
        }
        anyhow::Ok((outcome, alerts))
    })?;

    for alert in &alerts {
        let line = format!("{}: {}", alert.title, alert.message);
        match alert.kind {
            AlertKind::Success => println!("{}", line.green()),
            AlertKind::Error => println!("{}", line.red()),
            AlertKind::Info => println!("{}", line.cyan()),
        }
    }

    match outcome {
        SubmitOutcome::Succeeded(reply) => {
            println!("{}", serde_json::to_string_pretty(&reply.body)?);
            Ok(())
        }
        SubmitOutcome::Invalid { first_invalid } => bail!(
            "form is invalid; first invalid field: {}",
            first_invalid.as_deref().unwrap_or("-")
        ),
        SubmitOutcome::Failed(error) => bail!("submission failed: {error}"),
        SubmitOutcome::Ignored => bail!("submission ignored: another attempt is in progress"),
    }
}
