//! Error types for the form pipeline

use formflow_rules::RuleError;
use thiserror::Error;

use crate::transport::{ServerReply, TransportError};

/// Registration and addressing failures
#[derive(Debug, Error)]
pub enum FormError {
    #[error("form '{0}' is not registered")]
    UnknownForm(String),

    #[error("form '{0}' is not in the document")]
    MissingElement(String),

    #[error("form '{form}' has no field '{field}'")]
    UnknownField { form: String, field: String },

    #[error("form '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("field '{field}' of form '{form}': {source}")]
    InvalidRule {
        form: String,
        field: String,
        #[source]
        source: RuleError,
    },

    #[error("invalid markup: {0}")]
    Markup(String),
}

/// Why a submission attempt ended in the failed state
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("before-submit hook failed: {0:#}")]
    Hook(anyhow::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server rejected the submission")]
    Rejected { reply: ServerReply },
}

impl SubmitError {
    /// Message supplied by the server, if it sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            SubmitError::Rejected { reply } => reply.message.as_deref(),
            _ => None,
        }
    }
}
