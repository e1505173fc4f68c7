use anyhow::{bail, Result};
use colored::Colorize;
use formflow::FormflowConfig;
use std::path::Path;

use super::Fill;

pub fn execute(page: &Path, config: FormflowConfig, fill: &Fill) -> Result<()> {
    let report = super::runtime()?.block_on(async {
        let pipeline = super::load_pipeline(page, config, None).await?;
        super::apply(&pipeline, fill).await?;

        let valid = pipeline.validate_form(&fill.form).await?;
        let document = pipeline.document().await;

        let mut rows = Vec::new();
        for field in pipeline.fields(&fill.form).await? {
            let message = document
                .form(&fill.form)
                .and_then(|form| form.controls.get(field.control_index()))
                .map(|control| control.view.error_text.clone())
                .unwrap_or_default();
            rows.push((field.key().to_string(), field.is_valid(), message));
        }
        anyhow::Ok((valid, rows))
    })?;

    let (valid, rows) = report;
    for (name, field_valid, message) in &rows {
        if *field_valid {
            println!("  {} {}", "✓".green(), name);
        } else {
            println!("  {} {:<20} {}", "✗".red(), name, message.red());
        }
    }
    println!();

    if !valid {
        let invalid = rows.iter().filter(|(_, ok, _)| !ok).count();
        bail!("form '{}' has {} invalid field(s)", fill.form, invalid);
    }

    println!("{}", format!("✓ Form '{}' is valid", fill.form).green().bold());
    Ok(())
}
