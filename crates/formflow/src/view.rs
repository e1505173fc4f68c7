//! UI projections written onto the document by the pipeline.

use serde::Serialize;

/// `aria-describedby` target used when the error slot has no id
pub const DEFAULT_ERROR_ID: &str = "error";

pub const INVALID_CLASS: &str = "is-invalid";
pub const VALID_CLASS: &str = "is-valid";
pub const GROUP_ERROR_CLASS: &str = "has-error";
pub const GROUP_SUCCESS_CLASS: &str = "has-success";
pub const LOADING_CLASS: &str = "is-loading";

/// Validation state of one control as the host should render it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub error_text: String,
    pub error_visible: bool,
    pub invalid: bool,
    /// Valid *and* dirty: an untouched field never shows success styling
    pub success: bool,
    pub aria_invalid: bool,
    pub aria_describedby: Option<String>,
}

impl FieldView {
    pub fn project(valid: bool, dirty: bool, message: Option<&str>, error_id: Option<&str>) -> Self {
        let message = message.unwrap_or_default();
        let has_message = !message.is_empty();

        Self {
            error_text: message.to_string(),
            error_visible: has_message,
            invalid: !valid,
            success: valid && dirty,
            aria_invalid: has_message,
            aria_describedby: has_message
                .then(|| error_id.unwrap_or(DEFAULT_ERROR_ID).to_string()),
        }
    }

    pub fn control_classes(&self) -> Vec<&'static str> {
        let mut classes = Vec::new();
        if self.invalid {
            classes.push(INVALID_CLASS);
        }
        if self.success {
            classes.push(VALID_CLASS);
        }
        classes
    }

    pub fn group_classes(&self) -> Vec<&'static str> {
        let mut classes = Vec::new();
        if self.invalid {
            classes.push(GROUP_ERROR_CLASS);
        }
        if self.success {
            classes.push(GROUP_SUCCESS_CLASS);
        }
        classes
    }
}

/// Submit button state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    pub disabled: bool,
    pub loading: bool,
    pub aria_busy: bool,
}

impl ButtonView {
    pub fn set_loading(&mut self, loading: bool) {
        self.disabled = loading;
        self.loading = loading;
        self.aria_busy = loading;
    }

    pub fn classes(&self) -> Vec<&'static str> {
        if self.loading {
            vec![LOADING_CLASS]
        } else {
            Vec::new()
        }
    }
}
