// File: formflow/src/pipeline.rs
// Purpose: Form pipeline orchestration: discovery, field events, submission lifecycle

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use formflow_rules::{first_failure, RuleMessages};

use crate::alert::{Alert, AlertBus, AlertKind};
use crate::config::{FormflowConfig, SubmissionConfig};
use crate::document::{ControlTag, Document, FocusTarget, FormElement};
use crate::error::{FormError, SubmitError};
use crate::hooks::{run_strict, run_tolerant, Hook, HookContext, HookPhase};
use crate::registry::{generate_form_id, FieldRegistration, FormRegistration, SubmissionState};
use crate::transport::{Payload, ServerReply, SubmitRequest, Transport, TransportError};
use crate::view::FieldView;

/// How one submission attempt ended
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Another attempt was still running, or the submit button was disabled
    Ignored,
    /// Client-side validation failed; nothing was sent
    Invalid { first_invalid: Option<String> },
    Succeeded(ServerReply),
    Failed(Arc<SubmitError>),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }
}

struct PipelineState {
    document: Document,
    forms: HashMap<String, FormRegistration>,
}

impl PipelineState {
    fn registration(&self, form_id: &str) -> Result<&FormRegistration, FormError> {
        self.forms
            .get(form_id)
            .ok_or_else(|| FormError::UnknownForm(form_id.to_string()))
    }

    fn registration_mut(&mut self, form_id: &str) -> Result<&mut FormRegistration, FormError> {
        self.forms
            .get_mut(form_id)
            .ok_or_else(|| FormError::UnknownForm(form_id.to_string()))
    }

    fn element(&self, form_id: &str) -> Result<&FormElement, FormError> {
        self.document
            .form(form_id)
            .ok_or_else(|| FormError::MissingElement(form_id.to_string()))
    }

    fn register(&mut self, form_id: &str, messages: &RuleMessages) -> Result<(), FormError> {
        if self.forms.contains_key(form_id) {
            return Err(FormError::AlreadyRegistered(form_id.to_string()));
        }

        let registration = FormRegistration::build(form_id, self.element(form_id)?, messages)?;
        tracing::info!(
            form = form_id,
            fields = registration.fields().len(),
            "Form registered: {}",
            form_id
        );
        self.forms.insert(form_id.to_string(), registration);
        Ok(())
    }

    /// Clear the loading projection and return the form to idle
    fn end_attempt(&mut self, form_id: &str) {
        if let Some(button) = self
            .document
            .form_mut(form_id)
            .and_then(|form| form.submit_button.as_mut())
        {
            button.set_loading(false);
        }
        if let Some(registration) = self.forms.get_mut(form_id) {
            registration.state = SubmissionState::Idle;
        }
    }
}

/// Ends a submission attempt even when the `submit` future is dropped
/// mid-flight, e.g. by an outer timeout or an aborted task.
struct AttemptGuard {
    state: Arc<RwLock<PipelineState>>,
    form_id: String,
    armed: bool,
}

impl AttemptGuard {
    fn new(state: Arc<RwLock<PipelineState>>, form_id: &str) -> Self {
        Self {
            state,
            form_id: form_id.to_string(),
            armed: true,
        }
    }

    async fn release(mut self) {
        self.state.write().await.end_attempt(&self.form_id);
        self.armed = false;
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(form = %self.form_id, "submission cancelled before it finished");

        if let Ok(mut state) = self.state.try_write() {
            state.end_attempt(&self.form_id);
            return;
        }

        // The lock is busy; finish the cleanup once it frees up.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let state = Arc::clone(&self.state);
                let form_id = std::mem::take(&mut self.form_id);
                handle.spawn(async move {
                    state.write().await.end_attempt(&form_id);
                });
            }
            Err(_) => tracing::error!(
                form = %self.form_id,
                "no runtime to release a cancelled submission; the form stays busy"
            ),
        }
    }
}

fn unknown_field(form_id: &str, field: &str) -> FormError {
    FormError::UnknownField {
        form: form_id.to_string(),
        field: field.to_string(),
    }
}

fn build_request(element: &FormElement, submission: &SubmissionConfig) -> SubmitRequest {
    let url = element
        .attributes
        .get("action")
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(submission.default_action.as_str())
        .to_string();
    let method = element
        .attributes
        .get("method")
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(submission.default_method.as_str())
        .trim()
        .to_ascii_uppercase();

    SubmitRequest {
        url,
        method,
        payload: element.form_data(),
    }
}

/// Validation and submission pipeline over one document.
///
/// A cheap handle: clones share the same document, registrations and alert
/// bus. The state lock is never held while hooks or the transport run, so
/// other events may interleave at those points; the per-form
/// [`SubmissionState`] keeps a second submit from starting a parallel
/// attempt.
#[derive(Clone)]
pub struct FormPipeline {
    state: Arc<RwLock<PipelineState>>,
    transport: Arc<dyn Transport>,
    alerts: AlertBus,
    config: Arc<FormflowConfig>,
}

impl FormPipeline {
    pub fn new(document: Document, transport: Arc<dyn Transport>, config: FormflowConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(PipelineState {
                document,
                forms: HashMap::new(),
            })),
            transport,
            alerts: AlertBus::default(),
            config: Arc::new(config),
        }
    }

    /// Parse `markup` into a document and build a pipeline over it
    pub fn from_html(
        markup: &str,
        transport: Arc<dyn Transport>,
        config: FormflowConfig,
    ) -> Result<Self, FormError> {
        let document = Document::parse_html(markup, &config.discovery)?;
        Ok(Self::new(document, transport, config))
    }

    pub fn config(&self) -> &FormflowConfig {
        &self.config
    }

    /// Receive every `form:alert` raised from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.alerts.subscribe()
    }

    /// Register every opted-in form not managed yet.
    ///
    /// Forms without an id get a generated one written back to the
    /// document. Safe to call again after inserting forms: managed forms
    /// are skipped. A form that fails to register is logged and left out.
    /// Returns the ids registered by this call.
    pub async fn discover(&self) -> Vec<String> {
        let mut state = self.state.write().await;
        let discovery = &self.config.discovery;

        let mut candidates = Vec::new();
        for form in state.document.forms.iter_mut() {
            if !form.attributes.has(&discovery.form_marker) {
                continue;
            }
            let id = match form.id() {
                Some(id) => id.to_string(),
                None => {
                    let id = generate_form_id(&discovery.id_prefix);
                    form.attributes.set("id", id.clone());
                    id
                }
            };
            candidates.push(id);
        }

        let mut registered = Vec::new();
        for id in candidates {
            if state.forms.contains_key(&id) {
                continue;
            }
            match state.register(&id, &self.config.messages) {
                Ok(()) => registered.push(id),
                Err(e) => tracing::error!(form = %id, "form registration failed: {e}"),
            }
        }
        registered
    }

    /// Register one form by id, whether or not it carries the opt-in marker
    pub async fn register_form(&self, form_id: &str) -> Result<(), FormError> {
        self.state
            .write()
            .await
            .register(form_id, &self.config.messages)
    }

    /// Add a form to the document; call [`discover`](Self::discover) to manage it
    pub async fn insert_form(&self, form: FormElement) {
        self.state.write().await.document.forms.push(form);
    }

    pub async fn is_registered(&self, form_id: &str) -> bool {
        self.state.read().await.forms.contains_key(form_id)
    }

    pub async fn registered_forms(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.read().await.forms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn add_hook<H>(&self, form_id: &str, phase: HookPhase, hook: H) -> Result<(), FormError>
    where
        H: Hook + 'static,
    {
        let mut state = self.state.write().await;
        state.registration_mut(form_id)?.hooks.push(phase, Arc::new(hook));
        Ok(())
    }

    /// Copy of the document with every projection applied so far
    pub async fn document(&self) -> Document {
        self.state.read().await.document.clone()
    }

    pub async fn field(&self, form_id: &str, key: &str) -> Option<FieldRegistration> {
        let state = self.state.read().await;
        state.forms.get(form_id)?.field(key).cloned()
    }

    /// Every registration of a form, in document order
    pub async fn fields(&self, form_id: &str) -> Result<Vec<FieldRegistration>, FormError> {
        let state = self.state.read().await;
        Ok(state.registration(form_id)?.fields().to_vec())
    }

    pub async fn submission_state(&self, form_id: &str) -> Option<SubmissionState> {
        let state = self.state.read().await;
        state.forms.get(form_id).map(FormRegistration::state)
    }

    /// The user typed into a field.
    ///
    /// Marks it dirty; a field currently shown invalid is revalidated on
    /// the spot and the new validity returned. Valid fields wait for blur.
    pub async fn input(
        &self,
        form_id: &str,
        field: &str,
        value: impl Into<String>,
    ) -> Result<Option<bool>, FormError> {
        let value = value.into();
        let was_valid = self
            .update_control(form_id, field, |control| control.value = value.clone(), value.clone())
            .await?;

        if was_valid {
            return Ok(None);
        }
        self.validate_field(form_id, field).await.map(Some)
    }

    /// The user toggled a checkbox or radio; same revalidation as [`input`](Self::input)
    pub async fn set_checked(
        &self,
        form_id: &str,
        field: &str,
        checked: bool,
    ) -> Result<Option<bool>, FormError> {
        let was_valid = {
            let state = self.state.read().await;
            let registration = state.registration(form_id)?;
            let value = registration
                .field(field)
                .ok_or_else(|| unknown_field(form_id, field))?
                .value()
                .to_string();
            drop(state);
            self.update_control(form_id, field, |control| control.checked = checked, value)
                .await?
        };

        if was_valid {
            return Ok(None);
        }
        self.validate_field(form_id, field).await.map(Some)
    }

    /// Apply a user edit to a control and its registration; returns the
    /// field's validity before the edit.
    async fn update_control<F>(
        &self,
        form_id: &str,
        field: &str,
        edit: F,
        value: String,
    ) -> Result<bool, FormError>
    where
        F: FnOnce(&mut crate::document::Control),
    {
        let mut state = self.state.write().await;
        let PipelineState { document, forms } = &mut *state;

        let registration = forms
            .get_mut(form_id)
            .ok_or_else(|| FormError::UnknownForm(form_id.to_string()))?
            .field_mut(field)
            .ok_or_else(|| unknown_field(form_id, field))?;

        let control = document
            .form_mut(form_id)
            .and_then(|form| form.controls.get_mut(registration.control_index()))
            .ok_or_else(|| FormError::MissingElement(form_id.to_string()))?;

        edit(control);
        registration.value = value;
        registration.dirty = true;
        Ok(registration.valid)
    }

    /// The user left a field
    pub async fn blur(&self, form_id: &str, field: &str) -> Result<bool, FormError> {
        self.validate_field(form_id, field).await
    }

    /// Validate one field and project the result onto its control
    pub async fn validate_field(&self, form_id: &str, field: &str) -> Result<bool, FormError> {
        let (snapshot, rules, before, after) = {
            let state = self.state.read().await;
            let registration = state.registration(form_id)?;
            let reg_field = registration
                .field(field)
                .ok_or_else(|| unknown_field(form_id, field))?;
            let control = state
                .element(form_id)?
                .controls
                .get(reg_field.control_index())
                .ok_or_else(|| FormError::MissingElement(form_id.to_string()))?;

            let mut snapshot = reg_field.snapshot();
            snapshot.value = control.value.trim().to_string();

            (
                snapshot,
                reg_field.rules().to_vec(),
                registration.hooks.for_phase(HookPhase::BeforeValidate),
                registration.hooks.for_phase(HookPhase::AfterValidate),
            )
        };

        run_tolerant(
            &before,
            HookContext::BeforeValidate {
                form_id: form_id.to_string(),
                field: snapshot.clone(),
            },
        )
        .await;

        let message = first_failure(&rules, &snapshot.value).map(|rule| rule.message().to_string());
        let valid = message.is_none();

        let dirty = {
            let mut state = self.state.write().await;
            let PipelineState { document, forms } = &mut *state;

            let registration = forms
                .get_mut(form_id)
                .ok_or_else(|| FormError::UnknownForm(form_id.to_string()))?
                .field_mut(field)
                .ok_or_else(|| unknown_field(form_id, field))?;
            registration.valid = valid;

            let control = document
                .form_mut(form_id)
                .and_then(|form| form.controls.get_mut(registration.control_index()))
                .ok_or_else(|| FormError::MissingElement(form_id.to_string()))?;
            control.view = FieldView::project(
                valid,
                registration.dirty,
                message.as_deref(),
                control.error_id.as_deref(),
            );
            registration.dirty
        };

        tracing::debug!(form = form_id, field, valid, "field validated");

        run_tolerant(
            &after,
            HookContext::AfterValidate {
                form_id: form_id.to_string(),
                field: crate::hooks::FieldSnapshot {
                    valid,
                    dirty,
                    ..snapshot
                },
                valid,
                message,
            },
        )
        .await;

        Ok(valid)
    }

    /// Validate every field in document order.
    ///
    /// Never stops early: each field's projection is refreshed so all
    /// errors show at once.
    pub async fn validate_form(&self, form_id: &str) -> Result<bool, FormError> {
        let keys: Vec<String> = {
            let state = self.state.read().await;
            state
                .registration(form_id)?
                .fields()
                .iter()
                .map(|f| f.key().to_string())
                .collect()
        };

        let mut all_valid = true;
        for key in keys {
            if !self.validate_field(form_id, &key).await? {
                all_valid = false;
            }
        }
        Ok(all_valid)
    }

    /// A click on the form's submit button; a no-op while it is disabled
    pub async fn click_submit(&self, form_id: &str) -> Result<SubmitOutcome, FormError> {
        let disabled = {
            let state = self.state.read().await;
            state.registration(form_id)?;
            state
                .element(form_id)?
                .submit_button
                .as_ref()
                .is_some_and(|button| button.disabled)
        };

        if disabled {
            tracing::debug!(form = form_id, "submit button disabled, click ignored");
            return Ok(SubmitOutcome::Ignored);
        }
        self.submit(form_id).await
    }

    /// Enter pressed inside `field`: submits the form when the field is an
    /// `<input>` of a managed form, otherwise returns `None`.
    pub async fn enter_key(
        &self,
        form_id: &str,
        field: &str,
    ) -> Result<Option<SubmitOutcome>, FormError> {
        let is_input = {
            let state = self.state.read().await;
            if !state.forms.contains_key(form_id) {
                return Ok(None);
            }
            state
                .element(form_id)?
                .control(field)
                .ok_or_else(|| unknown_field(form_id, field))?
                .tag
                == ControlTag::Input
        };

        if !is_input {
            return Ok(None);
        }
        self.submit(form_id).await.map(Some)
    }

    /// Handle a submit of `form_id`, from the submit event or programmatically.
    ///
    /// The browser's default submission never happens; the pipeline owns
    /// it. Exactly one alert is raised for an attempt that reaches the
    /// network stage, none for an invalid or ignored one. Dropping the
    /// returned future releases the form: it goes back to idle with the
    /// loading projection cleared, and no alert is raised.
    pub async fn submit(&self, form_id: &str) -> Result<SubmitOutcome, FormError> {
        {
            let mut state = self.state.write().await;
            let registration = state.registration_mut(form_id)?;
            if registration.state != SubmissionState::Idle {
                tracing::debug!(form = form_id, state = ?registration.state, "submission already in progress");
                return Ok(SubmitOutcome::Ignored);
            }
            registration.state = SubmissionState::Validating;
        }

        let guard = AttemptGuard::new(Arc::clone(&self.state), form_id);
        let outcome = self.run_attempt(form_id).await;
        guard.release().await;
        outcome
    }

    async fn run_attempt(&self, form_id: &str) -> Result<SubmitOutcome, FormError> {
        if !self.validate_form(form_id).await? {
            let first_invalid = self.focus_first_error(form_id).await?;
            tracing::debug!(form = form_id, field = ?first_invalid, "submission blocked by validation");
            return Ok(SubmitOutcome::Invalid { first_invalid });
        }

        let (request, before_submit) = {
            let mut state = self.state.write().await;
            let request = build_request(state.element(form_id)?, &self.config.submission);
            let registration = state.registration_mut(form_id)?;
            registration.state = SubmissionState::Submitting;
            (request, registration.hooks.for_phase(HookPhase::BeforeSubmit))
        };

        tracing::info!(
            form = form_id,
            method = %request.method,
            url = %request.url,
            transport = self.transport.name(),
            "submitting form"
        );

        match self.deliver(form_id, &request, &before_submit).await {
            Ok(reply) => {
                self.complete_success(form_id, request.payload, reply.clone()).await;
                Ok(SubmitOutcome::Succeeded(reply))
            }
            Err(error) => {
                let error = Arc::new(error);
                self.complete_failure(form_id, error.clone()).await;
                Ok(SubmitOutcome::Failed(error))
            }
        }
    }

    async fn deliver(
        &self,
        form_id: &str,
        request: &SubmitRequest,
        before_submit: &[Arc<dyn Hook>],
    ) -> Result<ServerReply, SubmitError> {
        run_strict(
            before_submit,
            HookContext::BeforeSubmit {
                form_id: form_id.to_string(),
                payload: request.payload.clone(),
            },
        )
        .await
        .map_err(SubmitError::Hook)?;

        self.set_loading(form_id, true).await;

        let timeout = self.config.submission.timeout();
        let reply = tokio::time::timeout(timeout, self.transport.send(request))
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;

        if reply.success {
            Ok(reply)
        } else {
            Err(SubmitError::Rejected { reply })
        }
    }

    async fn complete_success(&self, form_id: &str, payload: Payload, reply: ServerReply) {
        let on_success = self.hooks_for(form_id, HookPhase::OnSuccess).await;
        run_tolerant(
            &on_success,
            HookContext::OnSuccess {
                form_id: form_id.to_string(),
                payload,
                reply: reply.clone(),
            },
        )
        .await;

        let after_submit = self.hooks_for(form_id, HookPhase::AfterSubmit).await;
        run_tolerant(
            &after_submit,
            HookContext::AfterSubmit {
                form_id: form_id.to_string(),
                reply,
            },
        )
        .await;

        let alerts = &self.config.alerts;
        self.alerts.publish(Alert::new(
            &alerts.success_title,
            &alerts.success_message,
            AlertKind::Success,
        ));

        if let Err(e) = self.reset_form(form_id).await {
            tracing::warn!(form = form_id, "could not reset form: {e}");
        }
    }

    async fn complete_failure(&self, form_id: &str, error: Arc<SubmitError>) {
        tracing::error!(form = form_id, "Form submission error: {error}");

        let on_error = self.hooks_for(form_id, HookPhase::OnError).await;
        run_tolerant(
            &on_error,
            HookContext::OnError {
                form_id: form_id.to_string(),
                error: error.clone(),
            },
        )
        .await;

        let alerts = &self.config.alerts;
        let message = error
            .server_message()
            .unwrap_or(alerts.failure_message.as_str());
        self.alerts
            .publish(Alert::new(&alerts.error_title, message, AlertKind::Error));
    }

    async fn set_loading(&self, form_id: &str, loading: bool) {
        let mut state = self.state.write().await;
        if let Some(button) = state
            .document
            .form_mut(form_id)
            .and_then(|form| form.submit_button.as_mut())
        {
            button.set_loading(loading);
        }
    }

    async fn focus_first_error(&self, form_id: &str) -> Result<Option<String>, FormError> {
        let mut state = self.state.write().await;
        let first = state
            .registration(form_id)?
            .first_invalid()
            .map(|f| f.key().to_string());

        if let Some(field) = &first {
            state.document.focus = Some(FocusTarget {
                form_id: form_id.to_string(),
                field: field.clone(),
            });
        }
        Ok(first)
    }

    async fn hooks_for(&self, form_id: &str, phase: HookPhase) -> Vec<Arc<dyn Hook>> {
        let state = self.state.read().await;
        state
            .forms
            .get(form_id)
            .map(|registration| registration.hooks.for_phase(phase))
            .unwrap_or_default()
    }

    /// Clear the form after a successful submission.
    ///
    /// Controls go back to their markup defaults, like
    /// `HTMLFormElement.reset()`; registrations are cleared to an empty
    /// value and marked valid and clean. Validation always reads the
    /// control, so a restored default is what the next pass sees.
    pub async fn reset_form(&self, form_id: &str) -> Result<(), FormError> {
        let mut state = self.state.write().await;
        let PipelineState { document, forms } = &mut *state;

        document
            .form_mut(form_id)
            .ok_or_else(|| FormError::MissingElement(form_id.to_string()))?
            .reset();

        if let Some(registration) = forms.get_mut(form_id) {
            registration.fields_mut().for_each(FieldRegistration::reset);
        }
        Ok(())
    }

    /// Drop every registration and its hooks
    pub async fn destroy(&self) {
        let mut state = self.state.write().await;
        state.forms.clear();
        tracing::info!("form pipeline destroyed");
    }
}
