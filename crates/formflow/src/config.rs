// File: formflow/src/config.rs
// Purpose: Configuration parsing from formflow.toml

use anyhow::{Context, Result};
use formflow_rules::RuleMessages;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormflowConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub submission: SubmissionConfig,

    #[serde(default)]
    pub messages: RuleMessages,

    #[serde(default)]
    pub alerts: AlertConfig,
}

/// Which forms are managed and where their error UI lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Opt-in attribute a form must carry (default: "data-form")
    #[serde(default = "default_form_marker")]
    pub form_marker: String,

    /// Class of the wrapper around a label, control and error slot
    #[serde(default = "default_group_class")]
    pub group_class: String,

    /// Class of the inline error element inside a group
    #[serde(default = "default_error_class")]
    pub error_class: String,

    /// Prefix for ids assigned to forms that have none
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

/// Network submission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Used when a form has no `action`
    #[serde(default = "default_action")]
    pub default_action: String,

    /// Used when a form has no `method`
    #[serde(default = "default_method")]
    pub default_method: String,

    /// Origin that relative actions resolve against
    #[serde(default)]
    pub base_url: Option<String>,

    /// Upper bound on one request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Copy for the outcome alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_success_title")]
    pub success_title: String,

    #[serde(default = "default_success_message")]
    pub success_message: String,

    #[serde(default = "default_error_title")]
    pub error_title: String,

    /// Shown when the server supplied no message of its own
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

// Default values
fn default_form_marker() -> String {
    "data-form".to_string()
}

fn default_group_class() -> String {
    "c-form__group".to_string()
}

fn default_error_class() -> String {
    "c-form__error".to_string()
}

fn default_id_prefix() -> String {
    "form".to_string()
}

fn default_action() -> String {
    "/api/form".to_string()
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_success_title() -> String {
    "成功".to_string()
}

fn default_success_message() -> String {
    "表單提交成功！".to_string()
}

fn default_error_title() -> String {
    "錯誤".to_string()
}

fn default_failure_message() -> String {
    "提交失敗，請稍後再試".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            form_marker: default_form_marker(),
            group_class: default_group_class(),
            error_class: default_error_class(),
            id_prefix: default_id_prefix(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            default_action: default_action(),
            default_method: default_method(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SubmissionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            success_title: default_success_title(),
            success_message: default_success_message(),
            error_title: default_error_title(),
            failure_message: default_failure_message(),
        }
    }
}

impl FormflowConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: FormflowConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./formflow.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("formflow.toml")
    }
}
