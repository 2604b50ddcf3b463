//! Interpretation error types

use thiserror::Error;

use crate::value::OperandError;

/// A resource guard that tripped
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LimitExceeded {
    #[error("strings longer than {max} are not supported (got {len})")]
    StringLength { len: usize, max: usize },

    #[error("values bigger than {max} are not supported (got {value})")]
    Number { value: f64, max: f64 },

    #[error("sequences longer than {max} are not supported (got {len})")]
    SequenceLength { len: usize, max: usize },
}

/// Errors that abort the interpretation of a tree
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpretError {
    /// Call target not in the registry
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Attribute access outside the whitelist
    #[error("access to '{member}' on '{type_name}' is forbidden")]
    ForbiddenAccess { type_name: String, member: String },

    /// Operator outside the whitelist
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("resource limit: {0}")]
    ResourceLimit(#[from] LimitExceeded),

    /// Tree shape the interpreter cannot have been given by the analyser
    #[error("malformed tree: {0}")]
    Malformed(String),

    #[error("{callee}(): {message}")]
    InvalidArguments { callee: String, message: String },

    #[error("'{0}' object is not callable")]
    NotCallable(String),

    #[error("'{type_name}' object has no attribute '{member}'")]
    UnknownMember { type_name: String, member: String },

    #[error(transparent)]
    Operands(#[from] OperandError),
}

impl InterpretError {
    pub fn invalid_arguments(callee: &str, message: impl Into<String>) -> Self {
        InterpretError::InvalidArguments {
            callee: callee.to_string(),
            message: message.into(),
        }
    }
}
