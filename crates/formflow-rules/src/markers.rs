//! Declarative field markers, decoupled from any live element.

use serde::{Deserialize, Serialize};

pub const REQUIRED_ATTR: &str = "required";
pub const TYPE_ATTR: &str = "type";
pub const MIN_LENGTH_ATTR: &str = "minlength";
pub const MAX_LENGTH_ATTR: &str = "maxlength";
pub const PATTERN_ATTR: &str = "pattern";
pub const PATTERN_MESSAGE_ATTR: &str = "data-pattern-message";

/// Raw validation markers read off one form control.
///
/// Values are kept exactly as authored; interpretation happens in
/// [`crate::parse_rules`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMarkers {
    #[serde(default)]
    pub required: bool,

    /// Normalized (lower-case) input type, `None` for textarea/select
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,

    #[serde(default)]
    pub min_length: Option<String>,

    #[serde(default)]
    pub max_length: Option<String>,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub pattern_message: Option<String>,
}

impl FieldMarkers {
    /// Collect markers through an attribute lookup.
    ///
    /// Boolean attributes count as present whatever their value, so
    /// `required="false"` still marks the field required.
    pub fn from_attributes<'a, F>(attr: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        Self {
            required: attr(REQUIRED_ATTR).is_some(),
            input_type: attr(TYPE_ATTR).map(|t| t.trim().to_ascii_lowercase()),
            min_length: attr(MIN_LENGTH_ATTR).map(str::to_string),
            max_length: attr(MAX_LENGTH_ATTR).map(str::to_string),
            pattern: attr(PATTERN_ATTR).map(str::to_string),
            pattern_message: attr(PATTERN_MESSAGE_ATTR).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_attributes() {
        let attrs: HashMap<&str, &str> = [
            ("required", ""),
            ("type", "EMAIL"),
            ("maxlength", "80"),
            ("data-pattern-message", "Company address only"),
        ]
        .into_iter()
        .collect();

        let markers = FieldMarkers::from_attributes(|name| attrs.get(name).copied());

        assert!(markers.required);
        assert_eq!(markers.input_type.as_deref(), Some("email"));
        assert_eq!(markers.min_length, None);
        assert_eq!(markers.max_length.as_deref(), Some("80"));
        assert_eq!(markers.pattern, None);
        assert_eq!(markers.pattern_message.as_deref(), Some("Company address only"));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let markers: FieldMarkers =
            serde_json::from_str(r#"{"required": true, "type": "tel", "minLength": "4"}"#).unwrap();
        assert!(markers.required);
        assert_eq!(markers.input_type.as_deref(), Some("tel"));
        assert_eq!(markers.min_length.as_deref(), Some("4"));
    }
}
