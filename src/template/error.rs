//! Resolution error types

use thiserror::Error;

use crate::value::OperandError;
use crate::variables::FormatError;

/// Errors that abort one resolution of a template
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    /// A variable's key could not be followed through the context
    #[error("missing context for key '{key}': {source}")]
    MissingContext { key: String, source: OperandError },

    /// An object rejected its bound keyword arguments
    #[error("{object} could not be initialized: {message}")]
    Initialization { object: String, message: String },

    /// A recorded operation failed on the bound value
    #[error("operation failed: {0}")]
    Operation(#[from] OperandError),

    #[error("{variable} was read before it was bound")]
    Unbound { variable: String },

    #[error("format failed: {0}")]
    Format(#[from] FormatError),

    #[error("template root must be a stack or layer, found '{0}'")]
    NotAnObject(String),
}

impl ResolveError {
    pub fn initialization(object: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::Initialization {
            object: object.into(),
            message: message.into(),
        }
    }
}
