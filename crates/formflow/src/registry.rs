// File: formflow/src/registry.rs
// Purpose: Form and field registrations built from the document

use formflow_rules::{parse_rules, FieldMarkers, Rule, RuleError, RuleMessages};
use uuid::Uuid;

use crate::document::FormElement;
use crate::error::FormError;
use crate::hooks::{FieldSnapshot, HookRegistry};

/// Where a form is in its submission lifecycle.
///
/// `invalid`, `succeeded` and `failed` are outcomes of an attempt rather
/// than resting states; every attempt ends back in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
}

/// Validation state of one managed control
#[derive(Debug, Clone)]
pub struct FieldRegistration {
    key: String,
    /// Index of the control inside its form element
    control: usize,
    rules: Vec<Rule>,
    pub(crate) value: String,
    pub(crate) dirty: bool,
    pub(crate) valid: bool,
}

impl FieldRegistration {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn control_index(&self) -> usize {
        self.control
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            key: self.key.clone(),
            value: self.value.trim().to_string(),
            dirty: self.dirty,
            valid: self.valid,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.value.clear();
        self.dirty = false;
        self.valid = true;
    }
}

/// One managed form: its fields, hooks and submission state
#[derive(Debug)]
pub struct FormRegistration {
    id: String,
    fields: Vec<FieldRegistration>,
    pub(crate) hooks: HookRegistry,
    pub(crate) state: SubmissionState,
}

impl FormRegistration {
    /// Build registrations for every keyed control of `element`.
    ///
    /// Controls without name or id are skipped, as is any later control
    /// reusing a key (the rest of a radio group). A non-integer length
    /// bound fails the build; an uncompilable pattern only loses its rule.
    pub fn build(id: &str, element: &FormElement, messages: &RuleMessages) -> Result<Self, FormError> {
        let mut fields: Vec<FieldRegistration> = Vec::new();

        for (index, control) in element.controls.iter().enumerate() {
            let Some(key) = control.key() else {
                tracing::warn!(form = id, index, "skipping control without name or id");
                continue;
            };
            if fields.iter().any(|f| f.key == key) {
                tracing::debug!(form = id, field = key, "control shares a key, not registered again");
                continue;
            }

            let rules = field_rules(id, key, control.markers(), messages).map_err(|source| {
                FormError::InvalidRule {
                    form: id.to_string(),
                    field: key.to_string(),
                    source,
                }
            })?;

            fields.push(FieldRegistration {
                key: key.to_string(),
                control: index,
                rules,
                value: control.value.clone(),
                dirty: false,
                valid: true,
            });
        }

        Ok(Self {
            id: id.to_string(),
            fields,
            hooks: HookRegistry::default(),
            state: SubmissionState::Idle,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[FieldRegistration] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldRegistration> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub(crate) fn field_mut(&mut self, key: &str) -> Option<&mut FieldRegistration> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = &mut FieldRegistration> {
        self.fields.iter_mut()
    }

    pub fn first_invalid(&self) -> Option<&FieldRegistration> {
        self.fields.iter().find(|f| !f.valid)
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
}

/// Parse a control's rules, leaving out a pattern the regex engine cannot
/// compile (lookaround, backreferences). The field keeps its other rules.
fn field_rules(
    form: &str,
    field: &str,
    mut markers: FieldMarkers,
    messages: &RuleMessages,
) -> Result<Vec<Rule>, RuleError> {
    match parse_rules(&markers, messages) {
        Err(e @ RuleError::InvalidPattern { .. }) => {
            tracing::warn!(form, field, "pattern rule ignored: {e}");
            markers.pattern = None;
            parse_rules(&markers, messages)
        }
        parsed => parsed,
    }
}

/// Fresh identifier for a form that has none, e.g. `form-3f2a9c1b7d4e`
pub fn generate_form_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Control, ControlTag};
    use formflow_rules::RuleTag;

    fn contact_form() -> FormElement {
        FormElement::new()
            .with_attr("id", "contact")
            .with_control(Control::input("email", "email").required())
            .with_control(Control::input("phone", "tel"))
            .with_control(Control::new(ControlTag::Input).with_attr("type", "submit"))
            .with_control(Control::input("plan", "radio").with_value("basic"))
            .with_control(Control::input("plan", "radio").with_value("pro"))
            .with_control(Control::textarea("note").with_attr("maxlength", "200"))
    }

    #[test]
    fn test_build_registers_keyed_controls_once() {
        let form = FormRegistration::build("contact", &contact_form(), &RuleMessages::default()).unwrap();

        let keys: Vec<&str> = form.fields().iter().map(FieldRegistration::key).collect();
        assert_eq!(keys, vec!["email", "phone", "plan", "note"]);

        let plan = form.field("plan").unwrap();
        assert_eq!(plan.control_index(), 3);
        assert_eq!(plan.value(), "basic");
    }

    #[test]
    fn test_build_parses_rules() {
        let form = FormRegistration::build("contact", &contact_form(), &RuleMessages::default()).unwrap();

        let email_tags: Vec<RuleTag> = form.field("email").unwrap().rules().iter().map(Rule::tag).collect();
        assert_eq!(email_tags, vec![RuleTag::Required, RuleTag::Email]);

        let note_tags: Vec<RuleTag> = form.field("note").unwrap().rules().iter().map(Rule::tag).collect();
        assert_eq!(note_tags, vec![RuleTag::MaxLength]);
    }

    #[test]
    fn test_new_fields_start_valid_and_clean() {
        let form = FormRegistration::build("contact", &contact_form(), &RuleMessages::default()).unwrap();
        assert!(form.fields().iter().all(|f| f.is_valid() && !f.is_dirty()));
        assert!(form.first_invalid().is_none());
        assert_eq!(form.state(), SubmissionState::Idle);
    }

    #[test]
    fn test_build_drops_uncompilable_pattern_only() {
        let element = FormElement::new().with_control(
            Control::input("password", "text")
                .required()
                .with_attr("minlength", "8")
                .with_attr("pattern", "(?=.*\\d).{8,}"),
        );
        let form = FormRegistration::build("signup", &element, &RuleMessages::default()).unwrap();

        let tags: Vec<RuleTag> = form.field("password").unwrap().rules().iter().map(Rule::tag).collect();
        assert_eq!(tags, vec![RuleTag::Required, RuleTag::MinLength]);
    }

    #[test]
    fn test_build_rejects_bad_bounds() {
        let element = FormElement::new()
            .with_control(Control::input("zip", "text").with_attr("maxlength", "five"));
        let err = FormRegistration::build("signup", &element, &RuleMessages::default()).unwrap_err();
        match err {
            FormError::InvalidRule { form, field, .. } => {
                assert_eq!(form, "signup");
                assert_eq!(field, "zip");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = generate_form_id("form");
        let b = generate_form_id("form");
        assert!(a.starts_with("form-"));
        assert_eq!(a.len(), "form-".len() + 12);
        assert_ne!(a, b);
    }
}
