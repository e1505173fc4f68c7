// File: formflow-rules/src/rule.rs
// Purpose: Rule model, rule parsing and first-failure evaluation

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::markers::{FieldMarkers, MAX_LENGTH_ATTR, MIN_LENGTH_ATTR};
use crate::messages::RuleMessages;
use crate::validators;

/// Rule discriminant. The declaration order is the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleTag {
    Required,
    Email,
    Phone,
    Url,
    MinLength,
    MaxLength,
    Pattern,
}

impl std::fmt::Display for RuleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleTag::Required => "required",
            RuleTag::Email => "email",
            RuleTag::Phone => "phone",
            RuleTag::Url => "url",
            RuleTag::MinLength => "minLength",
            RuleTag::MaxLength => "maxLength",
            RuleTag::Pattern => "pattern",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    Required,
    Email,
    Phone,
    Url,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
}

/// One validation rule with the message shown when it fails
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    message: String,
}

/// Serializable view of a rule, e.g. `{"type":"minLength","value":3,...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    #[serde(rename = "type")]
    pub tag: RuleTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleValue>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    Bound(usize),
    Pattern(String),
}

#[derive(Debug, Clone, Error)]
pub enum RuleError {
    #[error("{attribute}=\"{value}\" is not a non-negative integer")]
    InvalidBound {
        attribute: &'static str,
        value: String,
    },

    #[error("pattern \"{pattern}\" does not compile: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl Rule {
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tag(&self) -> RuleTag {
        match self.kind {
            RuleKind::Required => RuleTag::Required,
            RuleKind::Email => RuleTag::Email,
            RuleKind::Phone => RuleTag::Phone,
            RuleKind::Url => RuleTag::Url,
            RuleKind::MinLength(_) => RuleTag::MinLength,
            RuleKind::MaxLength(_) => RuleTag::MaxLength,
            RuleKind::Pattern(_) => RuleTag::Pattern,
        }
    }

    /// Check an already trimmed value against this rule
    pub fn is_satisfied_by(&self, value: &str) -> bool {
        match &self.kind {
            RuleKind::Required => validators::is_present(value),
            RuleKind::Email => validators::is_valid_email(value),
            RuleKind::Phone => validators::is_valid_phone(value),
            RuleKind::Url => validators::is_valid_url(value),
            RuleKind::MinLength(min) => validators::meets_min_length(value, *min),
            RuleKind::MaxLength(max) => validators::meets_max_length(value, *max),
            RuleKind::Pattern(re) => validators::matches_pattern(value, re),
        }
    }

    pub fn describe(&self) -> RuleDescriptor {
        let value = match &self.kind {
            RuleKind::MinLength(n) | RuleKind::MaxLength(n) => Some(RuleValue::Bound(*n)),
            RuleKind::Pattern(re) => Some(RuleValue::Pattern(re.as_str().to_string())),
            _ => None,
        };
        RuleDescriptor {
            tag: self.tag(),
            value,
            message: self.message.clone(),
        }
    }
}

fn parse_bound(attribute: &'static str, raw: &str) -> Result<usize, RuleError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| RuleError::InvalidBound {
            attribute,
            value: raw.to_string(),
        })
}

/// Derive the rule list for one field from its markers.
///
/// Rules come out in evaluation order: required, type, minLength,
/// maxLength, pattern. The same markers always give the same rules.
pub fn parse_rules(markers: &FieldMarkers, messages: &RuleMessages) -> Result<Vec<Rule>, RuleError> {
    let mut rules = Vec::new();

    if markers.required {
        rules.push(Rule::new(RuleKind::Required, &messages.required));
    }

    match markers.input_type.as_deref() {
        Some("email") => rules.push(Rule::new(RuleKind::Email, &messages.email)),
        Some("tel") => rules.push(Rule::new(RuleKind::Phone, &messages.phone)),
        Some("url") => rules.push(Rule::new(RuleKind::Url, &messages.url)),
        _ => {}
    }

    if let Some(raw) = &markers.min_length {
        let min = parse_bound(MIN_LENGTH_ATTR, raw)?;
        rules.push(Rule::new(RuleKind::MinLength(min), messages.min_length_for(min)));
    }

    if let Some(raw) = &markers.max_length {
        let max = parse_bound(MAX_LENGTH_ATTR, raw)?;
        rules.push(Rule::new(RuleKind::MaxLength(max), messages.max_length_for(max)));
    }

    if let Some(pattern) = &markers.pattern {
        let re = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        let message = markers
            .pattern_message
            .clone()
            .unwrap_or_else(|| messages.pattern.clone());
        rules.push(Rule::new(RuleKind::Pattern(re), message));
    }

    Ok(rules)
}

/// Find the rule a value breaks first, if any.
///
/// The value is trimmed before checking. Rules are visited in [`RuleTag`]
/// order whatever order the slice holds them in. Every rule sees the value,
/// blank or not: a blank optional email field fails the email rule.
pub fn first_failure<'a>(rules: &'a [Rule], value: &str) -> Option<&'a Rule> {
    let value = value.trim();

    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by_key(|rule| rule.tag());

    ordered.into_iter().find(|rule| !rule.is_satisfied_by(value))
}
