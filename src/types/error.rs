use thiserror::Error;

use super::rule::Target;

/// A rule handler's denial of a request.
///
/// This is the only failure the boolean protocols turn into `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rule '{handler}' denied the request: {reason}")]
pub struct VerificationError {
    pub handler: String,
    pub reason: String,
}

impl VerificationError {
    pub fn new(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            reason: reason.into(),
        }
    }
}

/// Caller or routing mistakes. Never recovered by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("wrong signal receiver, expected '{expected}' component but '{given}' was given")]
    WrongSignalReceiver { expected: String, given: String },

    #[error("no handler class is registered under the name '{name}'")]
    UnknownHandler { name: String },

    #[error("request parameter '{key}' must be a string")]
    NonStringParameter { key: String },
}

/// Errors produced by [`Verifier`](crate::Verifier) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Denied(#[from] VerificationError),

    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    #[error("no rule handler found for type '{handler}'")]
    UnexpectedType { handler: String },

    #[error("rules on render method '{target}' are not supported; declare them on the action method instead")]
    NotSupported { target: Target },
}

impl VerifyError {
    /// Whether this is a handler denial rather than a fault.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(self, VerifyError::Denied(_))
    }
}

/// Errors raised while assembling a [`Verifier`](crate::Verifier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("verifier requires a {0}")]
    MissingCollaborator(&'static str),
}

/// Errors raised while assembling a [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate class '{name}'")]
    DuplicateClass { name: String },

    #[error("handler name '{name}' is already bound to class '{class}'")]
    DuplicateHandler { name: String, class: String },

    #[error("duplicate member '{member}' in class '{class}'")]
    DuplicateMember { class: String, member: String },
}
