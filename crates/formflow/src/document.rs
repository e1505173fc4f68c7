// File: formflow/src/document.rs
// Purpose: Headless document model the pipeline reads values from and projects UI onto

use formflow_rules::FieldMarkers;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

use crate::config::DiscoveryConfig;
use crate::error::FormError;
use crate::transport::Payload;
use crate::view::{ButtonView, FieldView};

/// Element attributes, names lower-cased
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::default();
        for (k, v) in iter {
            attrs.set(k.as_ref(), v);
        }
        attrs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTag {
    Input,
    Textarea,
    Select,
}

/// One input, textarea or select
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub tag: ControlTag,
    pub attributes: Attributes,
    pub value: String,
    pub default_value: String,
    pub checked: bool,
    pub default_checked: bool,
    /// Inside a form group wrapper, which then mirrors the field state
    pub in_group: bool,
    /// Id of the inline error element, when it has one
    pub error_id: Option<String>,
    pub view: FieldView,
}

impl Control {
    pub fn new(tag: ControlTag) -> Self {
        Self {
            tag,
            attributes: Attributes::default(),
            value: String::new(),
            default_value: String::new(),
            checked: false,
            default_checked: false,
            in_group: false,
            error_id: None,
            view: FieldView::default(),
        }
    }

    /// `<input name=... type=...>`
    pub fn input(name: &str, input_type: &str) -> Self {
        let mut control = Self::new(ControlTag::Input)
            .with_attr("name", name)
            .with_attr("type", input_type);
        if matches!(input_type, "checkbox" | "radio") {
            control = control.with_value("on");
        }
        control
    }

    pub fn textarea(name: &str) -> Self {
        Self::new(ControlTag::Textarea).with_attr("name", name)
    }

    pub fn select(name: &str) -> Self {
        Self::new(ControlTag::Select).with_attr("name", name)
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn required(self) -> Self {
        self.with_attr("required", "")
    }

    /// Sets both the current and the markup default value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.default_value = self.value.clone();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self.default_checked = checked;
        self
    }

    /// Wrap in a form group whose error element has `error_id`
    pub fn in_group(mut self, error_id: Option<&str>) -> Self {
        self.in_group = true;
        self.error_id = error_id.map(str::to_string);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").filter(|n| !n.is_empty())
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").filter(|n| !n.is_empty())
    }

    /// Identity within the form: name, falling back to id
    pub fn key(&self) -> Option<&str> {
        self.name().or_else(|| self.id())
    }

    /// Lower-cased `type` of an input (default "text"); `None` otherwise
    pub fn input_type(&self) -> Option<String> {
        match self.tag {
            ControlTag::Input => Some(
                self.attributes
                    .get("type")
                    .map(|t| t.trim().to_ascii_lowercase())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "text".to_string()),
            ),
            _ => None,
        }
    }

    pub fn markers(&self) -> FieldMarkers {
        let mut markers = FieldMarkers::from_attributes(|name| self.attributes.get(name));
        markers.input_type = self.input_type();
        markers
    }

    pub fn is_disabled(&self) -> bool {
        self.attributes.has("disabled")
    }

    /// Whether the control contributes to the submitted form data
    pub fn is_successful(&self) -> bool {
        if self.is_disabled() || self.name().is_none() {
            return false;
        }
        match self.input_type().as_deref() {
            Some("submit" | "reset" | "button" | "image" | "file") => false,
            Some("checkbox" | "radio") => self.checked,
            _ => true,
        }
    }

    pub fn reset(&mut self) {
        self.value = self.default_value.clone();
        self.checked = self.default_checked;
        self.view = FieldView::default();
    }
}

/// One `<form>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormElement {
    pub attributes: Attributes,
    pub controls: Vec<Control>,
    /// First `button[type=submit]`, when present
    pub submit_button: Option<ButtonView>,
}

impl FormElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn with_control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_submit_button(mut self) -> Self {
        self.submit_button = Some(ButtonView::default());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").filter(|id| !id.is_empty())
    }

    /// First control answering to `key` (name, else id)
    pub fn control(&self, key: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.key() == Some(key))
    }

    /// Field name → value for every successful control, in document order.
    /// A repeated name keeps its first position and takes the later value.
    pub fn form_data(&self) -> Payload {
        let mut data = Payload::new();
        for control in self.controls.iter().filter(|c| c.is_successful()) {
            if let Some(name) = control.name() {
                data.insert(name.to_string(), control.value.clone());
            }
        }
        data
    }

    /// Restore markup defaults, like `HTMLFormElement.reset()`
    pub fn reset(&mut self) {
        self.controls.iter_mut().for_each(Control::reset);
    }
}

/// Which control holds focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    pub form_id: String,
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub forms: Vec<FormElement>,
    pub focus: Option<FocusTarget>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(mut self, form: FormElement) -> Self {
        self.forms.push(form);
        self
    }

    pub fn form(&self, id: &str) -> Option<&FormElement> {
        self.forms.iter().find(|f| f.id() == Some(id))
    }

    pub fn form_mut(&mut self, id: &str) -> Option<&mut FormElement> {
        self.forms.iter_mut().find(|f| f.id() == Some(id))
    }

    /// Load every form from HTML markup.
    ///
    /// Group and error-slot detection use the class names in `discovery`.
    pub fn parse_html(markup: &str, discovery: &DiscoveryConfig) -> Result<Self, FormError> {
        let html = Html::parse_document(markup);
        let form_sel = selector("form")?;
        let control_sel = selector("input, textarea, select")?;
        let submit_sel = selector(r#"button[type="submit"]"#)?;
        let error_sel = selector(&format!(".{}", discovery.error_class))?;

        let mut document = Document::new();
        for form in html.select(&form_sel) {
            let controls = form
                .select(&control_sel)
                .filter_map(|el| control_from_element(el, discovery, &error_sel))
                .collect();

            document.forms.push(FormElement {
                attributes: form.value().attrs().collect(),
                controls,
                submit_button: form.select(&submit_sel).next().map(|_| ButtonView::default()),
            });
        }

        tracing::debug!(forms = document.forms.len(), "parsed document");
        Ok(document)
    }
}

fn selector(source: &str) -> Result<Selector, FormError> {
    Selector::parse(source).map_err(|e| FormError::Markup(format!("selector {source}: {e:?}")))
}

fn control_from_element(
    el: ElementRef<'_>,
    discovery: &DiscoveryConfig,
    error_sel: &Selector,
) -> Option<Control> {
    let tag = match el.value().name() {
        "input" => ControlTag::Input,
        "textarea" => ControlTag::Textarea,
        "select" => ControlTag::Select,
        _ => return None,
    };

    let mut control = Control::new(tag);
    control.attributes = el.value().attrs().collect();

    let value = match tag {
        ControlTag::Input => {
            let is_toggle = matches!(control.input_type().as_deref(), Some("checkbox" | "radio"));
            let default = if is_toggle { "on" } else { "" };
            control.checked = control.attributes.has("checked");
            el.value().attr("value").unwrap_or(default).to_string()
        }
        ControlTag::Textarea => el.text().collect(),
        ControlTag::Select => selected_option(el),
    };
    control.value = value.clone();
    control.default_value = value;
    control.default_checked = control.checked;

    let group = el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().classes().any(|c| c == discovery.group_class));
    if let Some(group) = group {
        control.in_group = true;
        control.error_id = group
            .select(error_sel)
            .next()
            .and_then(|slot| slot.value().id())
            .map(str::to_string);
    }

    Some(control)
}

/// Value of the selected option, else the first one
fn selected_option(select: ElementRef<'_>) -> String {
    let Ok(option_sel) = Selector::parse("option") else {
        return String::new();
    };
    let options: Vec<ElementRef<'_>> = select.select(&option_sel).collect();
    let chosen = options
        .iter()
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| options.first());

    chosen
        .map(|o| match o.value().attr("value") {
            Some(v) => v.to_string(),
            None => o.text().collect::<String>().trim().to_string(),
        })
        .unwrap_or_default()
}
