//! Formflow WASM
//!
//! WebAssembly bindings for formflow rules.
//! Lets a page validate fields in the browser with the exact rules and
//! messages the pipeline uses.

use formflow_rules::{first_failure, parse_rules, validators, FieldMarkers, Rule, RuleMessages};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Validation outcome returned to JavaScript
#[derive(Serialize, Debug, Clone)]
pub struct FieldResult {
    pub valid: bool,
    pub message: Option<String>,
}

fn decode_markers(markers: JsValue) -> Result<FieldMarkers, JsValue> {
    serde_wasm_bindgen::from_value(markers)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse markers: {}", e)))
}

/// `undefined`/`null` means the built-in messages
fn decode_messages(messages: JsValue) -> Result<RuleMessages, JsValue> {
    if messages.is_undefined() || messages.is_null() {
        return Ok(RuleMessages::default());
    }
    serde_wasm_bindgen::from_value(messages)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse messages: {}", e)))
}

fn build_rules(markers: JsValue, messages: JsValue) -> Result<Vec<Rule>, JsValue> {
    let markers = decode_markers(markers)?;
    let messages = decode_messages(messages)?;
    parse_rules(&markers, &messages).map_err(|e| {
        web_sys::console::warn_1(&JsValue::from_str(&e.to_string()));
        JsValue::from_str(&e.to_string())
    })
}

/// Describe the rules a set of markers produces
///
/// # Example (JavaScript)
/// ```javascript
/// const rules = parseRules({ required: true, type: 'email' });
/// // [{ type: 'required', message: '此欄位為必填' }, { type: 'email', ... }]
/// ```
#[wasm_bindgen(js_name = parseRules)]
pub fn parse_rules_js(markers: JsValue, messages: JsValue) -> Result<JsValue, JsValue> {
    let descriptors: Vec<_> = build_rules(markers, messages)?
        .iter()
        .map(Rule::describe)
        .collect();
    Ok(serde_wasm_bindgen::to_value(&descriptors)?)
}

/// Validate a single field value
///
/// # Arguments
/// * `value` - The raw value; surrounding whitespace is ignored
/// * `markers` - JavaScript object with the field's markers
/// * `messages` - Optional message overrides
///
/// # Returns
/// `{ valid, message }`, where `message` is the first failing rule's text
///
/// # Example (JavaScript)
/// ```javascript
/// const { valid, message } = validateField('ab', { required: true, minLength: '3' });
/// ```
#[wasm_bindgen(js_name = validateField)]
pub fn validate_field(value: &str, markers: JsValue, messages: JsValue) -> Result<JsValue, JsValue> {
    let rules = build_rules(markers, messages)?;
    Ok(serde_wasm_bindgen::to_value(&check(&rules, value))?)
}

fn check(rules: &[Rule], value: &str) -> FieldResult {
    let failure = first_failure(rules, value);
    FieldResult {
        valid: failure.is_none(),
        message: failure.map(|rule| rule.message().to_string()),
    }
}

/// Quick email validation
#[wasm_bindgen(js_name = isValidEmail)]
pub fn is_valid_email_js(email: &str) -> bool {
    validators::is_valid_email(email)
}

/// Quick phone validation
#[wasm_bindgen(js_name = isValidPhone)]
pub fn is_valid_phone_js(phone: &str) -> bool {
    validators::is_valid_phone(phone)
}

/// Quick URL validation
#[wasm_bindgen(js_name = isValidUrl)]
pub fn is_valid_url_js(url: &str) -> bool {
    validators::is_valid_url(url)
}
