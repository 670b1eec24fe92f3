//! Unified Error Model
use thiserror::Error;

use crate::template::TemplateStatus;

/// Errors raised by template-authoring operations.
///
/// Evaluation never produces these: the engines and the validator fail
/// closed instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("FIELD/DUPLICATE: field id '{0}' already exists")]
    DuplicateField(String),

    #[error("FIELD/NOT_FOUND: no field with id '{0}'")]
    FieldNotFound(String),

    #[error("FIELD/PROTECTED: '{field}' is a core field, {reason}")]
    ProtectedField { field: String, reason: String },

    #[error("STATUS/TRANSITION: cannot move template from {from} to {to}")]
    InvalidTransition {
        from: TemplateStatus,
        to: TemplateStatus,
    },

    #[error("STATUS/BLOCKED: activation blocked by {0} error(s)")]
    ActivationBlocked(usize),

    #[error("PARSE/{0}")]
    Parse(String),

    #[error("SERIALIZE/{0}")]
    Serialize(String),
}

/// Errors raised by a [`TemplateStore`](crate::store::TemplateStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("STORE/CORRUPT: entry '{key}' could not be decoded: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("STORE/ENCODE: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("STORE/BACKEND: {0}")]
    Backend(String),
}
