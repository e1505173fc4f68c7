use anyhow::Result;
use colored::Colorize;
use formflow::{FormflowConfig, Rule, RuleDescriptor, RuleValue};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct FormSummary {
    id: String,
    action: String,
    method: String,
    fields: Vec<FieldSummary>,
}

#[derive(Debug, Serialize)]
struct FieldSummary {
    name: String,
    rules: Vec<RuleDescriptor>,
}

pub fn execute(page: &Path, config: FormflowConfig, json: bool) -> Result<()> {
    let submission = config.submission.clone();

    let forms = super::runtime()?.block_on(async {
        let pipeline = super::load_pipeline(page, config, None).await?;
        let document = pipeline.document().await;

        let mut forms = Vec::new();
        for id in pipeline.registered_forms().await {
            let Some(element) = document.form(&id) else {
                continue;
            };
            let attr = |name: &str, default: &str| {
                element
                    .attributes
                    .get(name)
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(default)
                    .to_string()
            };

            let fields = pipeline
                .fields(&id)
                .await?
                .iter()
                .map(|field| FieldSummary {
                    name: field.key().to_string(),
                    rules: field.rules().iter().map(Rule::describe).collect(),
                })
                .collect();

            forms.push(FormSummary {
                action: attr("action", &submission.default_action),
                method: attr("method", &submission.default_method).to_ascii_uppercase(),
                id,
                fields,
            });
        }
        anyhow::Ok(forms)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forms)?);
        return Ok(());
    }

    if forms.is_empty() {
        println!("{}", "⚠ No managed forms found".yellow());
        return Ok(());
    }

    for form in &forms {
        println!(
            "{} {}  {} {}",
            "Form".green().bold(),
            form.id.bold(),
            form.method.cyan(),
            form.action
        );
        for field in &form.fields {
            let rules: Vec<String> = field.rules.iter().map(describe_rule).collect();
            let rules = if rules.is_empty() {
                "-".dimmed().to_string()
            } else {
                rules.join(", ")
            };
            println!("  {:<20} {}", field.name, rules);
        }
        println!();
    }

    Ok(())
}

fn describe_rule(rule: &RuleDescriptor) -> String {
    match &rule.value {
        Some(RuleValue::Bound(n)) => format!("{}({})", rule.tag, n),
        Some(RuleValue::Pattern(p)) => format!("{}(/{}/)", rule.tag, p),
        None => rule.tag.to_string(),
    }
}
