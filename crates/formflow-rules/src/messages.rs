// File: formflow-rules/src/messages.rs
// Purpose: Failure messages attached to parsed rules

use serde::{Deserialize, Serialize};

/// Catalogue of rule failure messages.
///
/// `min_length` and `max_length` are templates: `{min}` and `{max}` are
/// replaced by the declared bound. Defaults are the site's Traditional
/// Chinese copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMessages {
    #[serde(default = "default_required")]
    pub required: String,

    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_phone")]
    pub phone: String,

    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_min_length")]
    pub min_length: String,

    #[serde(default = "default_max_length")]
    pub max_length: String,

    /// Used when a pattern field has no `data-pattern-message`
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_required() -> String {
    "此欄位為必填".to_string()
}

fn default_email() -> String {
    "請輸入有效的電子郵件地址".to_string()
}

fn default_phone() -> String {
    "請輸入有效的電話號碼".to_string()
}

fn default_url() -> String {
    "請輸入有效的網址".to_string()
}

fn default_min_length() -> String {
    "至少需要 {min} 個字元".to_string()
}

fn default_max_length() -> String {
    "最多 {max} 個字元".to_string()
}

fn default_pattern() -> String {
    "格式不正確".to_string()
}

impl Default for RuleMessages {
    fn default() -> Self {
        Self {
            required: default_required(),
            email: default_email(),
            phone: default_phone(),
            url: default_url(),
            min_length: default_min_length(),
            max_length: default_max_length(),
            pattern: default_pattern(),
        }
    }
}

impl RuleMessages {
    pub fn min_length_for(&self, min: usize) -> String {
        self.min_length.replace("{min}", &min.to_string())
    }

    pub fn max_length_for(&self, max: usize) -> String {
        self.max_length.replace("{max}", &max.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_templates() {
        let messages = RuleMessages::default();
        assert_eq!(messages.min_length_for(3), "至少需要 3 個字元");
        assert_eq!(messages.max_length_for(40), "最多 40 個字元");
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let messages: RuleMessages =
            serde_json::from_str(r#"{"required": "This field is required"}"#).unwrap();
        assert_eq!(messages.required, "This field is required");
        assert_eq!(messages.pattern, "格式不正確");
    }
}
