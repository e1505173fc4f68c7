// Shared fixtures for pipeline integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use formflow::{
    Document, FormPipeline, FormflowConfig, ServerReply, SubmitRequest, Transport,
    TransportError,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const CONTACT_PAGE: &str = r#"
<html><body>
  <form id="contact" data-form action="/api/contact" method="post">
    <div class="c-form__group">
      <input name="email" type="email" required>
      <div class="c-form__error" id="email-error"></div>
    </div>
    <button type="submit">Send</button>
  </form>
</body></html>
"#;

pub const SIGNUP_PAGE: &str = r#"
<html><body>
  <form id="signup" data-form>
    <div class="c-form__group">
      <input name="username" type="text" required minlength="3" maxlength="12">
      <div class="c-form__error" id="username-error"></div>
    </div>
    <div class="c-form__group">
      <input name="email" type="email" required>
      <div class="c-form__error" id="email-error"></div>
    </div>
    <div class="c-form__group">
      <input name="phone" type="tel">
      <div class="c-form__error"></div>
    </div>
    <div class="c-form__group">
      <input name="zip" type="text" pattern="\d{3}" data-pattern-message="請輸入三碼郵遞區號">
    </div>
    <textarea name="bio" maxlength="20"></textarea>
    <select name="plan">
      <option value="free">Free</option>
      <option value="pro">Pro</option>
    </select>
    <button type="submit">Create</button>
  </form>
  <form id="search"><input name="q"></form>
</body></html>
"#;

/// What the transport does for one call
pub enum Step {
    Reply(Value),
    NetworkDown,
    /// Never answers
    Hang,
    /// Answers once the notify fires
    Wait(Arc<Notify>, Value),
}

/// In-memory transport that replays scripted steps and records requests.
/// With the script exhausted every call succeeds.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<SubmitRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<SubmitRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &SubmitRequest) -> Result<ServerReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();

        match step.unwrap_or_else(|| Step::Reply(json!({ "success": true }))) {
            Step::Reply(body) => Ok(ServerReply::from_body(body)),
            Step::NetworkDown => Err(TransportError::Network("connection refused".into())),
            Step::Hang => std::future::pending().await,
            Step::Wait(gate, body) => {
                gate.notified().await;
                Ok(ServerReply::from_body(body))
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Pipeline over `markup` with every opted-in form registered
pub async fn pipeline(markup: &str, transport: &Arc<ScriptedTransport>) -> FormPipeline {
    pipeline_with(markup, transport, FormflowConfig::default()).await
}

pub async fn pipeline_with(
    markup: &str,
    transport: &Arc<ScriptedTransport>,
    config: FormflowConfig,
) -> FormPipeline {
    let document = Document::parse_html(markup, &config.discovery).unwrap();
    let pipeline = FormPipeline::new(document, transport.clone(), config);
    pipeline.discover().await;
    pipeline
}
