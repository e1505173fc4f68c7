//! # Formflow - Form Validation & Submission Pipeline
//!
//! Declarative validation for plain HTML forms. Rules come from standard
//! attributes (`required`, `type`, `minlength`, `maxlength`, `pattern`),
//! errors are projected next to each field, and valid forms are posted as
//! JSON with the outcome reported as an alert.
//!
//! ## Features
//!
//! - **Attribute Rules**: no schema to maintain, the markup is the schema
//! - **Dynamic Revalidation**: fields shown invalid clear as soon as they are fixed
//! - **Lifecycle Hooks**: async callbacks around validation and submission
//! - **Pluggable Transport**: reqwest-backed HTTP by default
//!
//! ## Example
//!
//! ```rust,no_run
//! use formflow::{FormPipeline, FormflowConfig, HttpTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = FormflowConfig::load_default()?;
//!     let transport = HttpTransport::new(Some("http://localhost:3000"))?;
//!     let markup = std::fs::read_to_string("contact.html")?;
//!
//!     let pipeline = FormPipeline::from_html(&markup, Arc::new(transport), config)?;
//!     pipeline.discover().await;
//!
//!     pipeline.input("contact", "email", "user@example.com").await?;
//!     let outcome = pipeline.submit("contact").await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod alert;
pub mod config;
pub mod document;
pub mod error;
pub mod hooks;
pub mod pipeline;
pub mod registry;
pub mod transport;
pub mod view;

pub use alert::{Alert, AlertBus, AlertKind, ALERT_EVENT};
pub use config::FormflowConfig;
pub use document::{Control, ControlTag, Document, FormElement};
pub use error::{FormError, SubmitError};
pub use hooks::{FieldSnapshot, Hook, HookContext, HookPhase};
pub use pipeline::{FormPipeline, SubmitOutcome};
pub use registry::{FieldRegistration, SubmissionState};
pub use transport::{HttpTransport, Payload, ServerReply, SubmitRequest, Transport, TransportError};

pub use formflow_rules::{Rule, RuleDescriptor, RuleMessages, RuleTag, RuleValue};
