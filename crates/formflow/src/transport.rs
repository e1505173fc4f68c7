//! Delivery of serialized form data to the backend endpoint.

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Flat field name → value map sent as the JSON body, in document order
pub type Payload = IndexMap<String, String>;

pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// One submission attempt, ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitRequest {
    pub url: String,
    /// Upper-cased HTTP method
    pub method: String,
    pub payload: Payload,
}

/// Parsed JSON reply from the endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReply {
    pub success: bool,
    pub message: Option<String>,
    pub body: Value,
}

impl ServerReply {
    /// Interpret a reply body.
    ///
    /// `success` is judged by JavaScript truthiness, so `1` and `"yes"`
    /// count while `0`, `""` and `null` do not.
    pub fn from_body(body: Value) -> Self {
        let success = body.get("success").is_some_and(is_truthy);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        Self {
            success,
            message,
            body,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    Request(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("response is not valid JSON: {0}")]
    Decode(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Sends a submission and returns the endpoint's reply.
///
/// Non-2xx responses and undecodable bodies are errors; a decoded body
/// whose `success` is falsy is still `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &SubmitRequest) -> Result<ServerReply, TransportError>;

    /// Get transport name
    fn name(&self) -> &'static str;
}

/// JSON-over-HTTP transport backed by reqwest
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    /// `base_url` is the page origin relative actions resolve against
    pub fn new(base_url: Option<&str>) -> Result<Self, TransportError> {
        let base_url = base_url
            .map(|raw| {
                Url::parse(raw).map_err(|e| TransportError::Request(format!("base url {raw}: {e}")))
            })
            .transpose()?;

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn resolve(&self, action: &str) -> Result<Url, TransportError> {
        match Url::parse(action) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    TransportError::Request(format!("relative action {action} needs a base url"))
                })?;
                base.join(action)
                    .map_err(|e| TransportError::Request(format!("action {action}: {e}")))
            }
            Err(e) => Err(TransportError::Request(format!("action {action}: {e}"))),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SubmitRequest) -> Result<ServerReply, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::Request(format!("method {}", request.method)))?;
        if method == Method::GET || method == Method::HEAD {
            return Err(TransportError::Request(format!(
                "{method} requests cannot carry a body"
            )));
        }

        let url = self.resolve(&request.url)?;
        let body = serde_json::to_vec(&request.payload)
            .map_err(|e| TransportError::Request(e.to_string()))?;

        tracing::debug!(%method, %url, fields = request.payload.len(), "sending form data");

        let response = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(ServerReply::from_body(body))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
