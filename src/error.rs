//! Error types for the service specification layer.
//!
//! Grammar and validation failures are always fatal and carry the offending
//! text or handler name. Everything above the specification layer wraps
//! these in `anyhow::Error` with file and phase context.

use thiserror::Error;

/// Errors raised while parsing or validating a service specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// The compact signature text does not match the expected shape
    #[error("invalid signature '{text}': {reason}")]
    Signature {
        /// Offending signature text, as written in `service.yaml`
        text: String,
        /// What is wrong with it
        reason: String,
    },

    /// A handler violates a per-category rule
    #[error("handler '{handler}': {reason}")]
    Handler {
        /// Handler name (or signature text when the name is unknown)
        handler: String,
        /// The rule that was violated
        reason: String,
    },

    /// The `general` section is invalid
    #[error("general: {reason}")]
    General {
        /// The rule that was violated
        reason: String,
    },

    /// Two handlers share a case-insensitively identical name
    #[error("duplicate handler name '{name}'")]
    DuplicateName {
        /// Name of the second occurrence
        name: String,
    },
}

impl SpecError {
    pub(crate) fn signature(text: &str, reason: impl Into<String>) -> Self {
        SpecError::Signature {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn handler(handler: &str, reason: impl Into<String>) -> Self {
        SpecError::Handler {
            handler: handler.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn general(reason: impl Into<String>) -> Self {
        SpecError::General {
            reason: reason.into(),
        }
    }
}
