pub mod check;
pub mod inspect;
pub mod submit;

use anyhow::{Context, Result};
use clap::Args;
use formflow::{FormPipeline, FormflowConfig, HttpTransport};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Which form to fill and with what
#[derive(Args, Debug, Clone)]
pub struct Fill {
    /// Form id
    #[arg(short, long)]
    pub form: String,

    /// Field value, as name=value (repeatable)
    #[arg(short, long = "set", value_parser = parse_assignment)]
    pub values: Vec<(String, String)>,

    /// Tick a checkbox or radio by field name (repeatable)
    #[arg(long = "check")]
    pub checked: Vec<String>,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Read `page` and register its forms
pub async fn load_pipeline(
    page: &Path,
    config: FormflowConfig,
    base_url: Option<&str>,
) -> Result<FormPipeline> {
    let markup = fs::read_to_string(page)
        .with_context(|| format!("Failed to read page: {:?}", page))?;
    let transport = HttpTransport::new(base_url)?;

    let pipeline = FormPipeline::from_html(&markup, Arc::new(transport), config)?;
    pipeline.discover().await;
    Ok(pipeline)
}

/// Apply `fill` the way a user would: type, then leave the field
pub async fn apply(pipeline: &FormPipeline, fill: &Fill) -> Result<()> {
    for (name, value) in &fill.values {
        pipeline.input(&fill.form, name, value.as_str()).await?;
        pipeline.blur(&fill.form, name).await?;
    }
    for name in &fill.checked {
        pipeline.set_checked(&fill.form, name, true).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("email=user@example.com"),
            Ok(("email".to_string(), "user@example.com".to_string()))
        );
        assert_eq!(parse_assignment("q="), Ok(("q".to_string(), String::new())));
        assert_eq!(
            parse_assignment("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert!(parse_assignment("email").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
