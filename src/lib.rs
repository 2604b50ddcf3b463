//! Imagestack - composable layer-stack templates
//!
//! Templates are object graphs of layers whose arguments may be deferred
//! [`Variable`]s. They are written in code or as text in a small, sandboxed
//! call-expression language, and resolved against a runtime context into a
//! concrete [`Layer`] graph.
//!
//! # Example
//!
//! ```rust
//! use imagestack::{resolve_text, Layer, Value};
//!
//! let context: Value = [("level", 7)].into_iter().collect();
//! let stack = resolve_text(
//!     "ImageStack([TextLayer(text=Variable('level').formatted('Lv. {}'))])",
//!     &context,
//! ).unwrap();
//!
//! assert!(matches!(stack, Layer::ImageStack(_)));
//! assert_eq!(stack.text_lines(), vec!["Lv. 7"]);
//! ```

pub mod color;
pub mod config;
pub mod context;
pub mod error;
pub mod interpreter;
pub mod layers;
pub mod object;
pub mod parser;
pub mod source;
pub mod template;
pub mod value;
pub mod variables;

pub use config::{InterpreterConfig, Limits};
pub use context::{ContextError, ContextFormat};
pub use error::ParseError;
pub use interpreter::{interpret, interpret_with_config, InterpretError, Registry};
pub use layers::Layer;
pub use object::{Object, ObjectKind};
pub use parser::{analyse, Tree};
pub use source::{to_source, SourceError};
pub use template::{resolve, ResolveError, Template};
pub use value::{OperandError, Value};
pub use variables::{Key, Variable};

use thiserror::Error;

/// Errors from any stage between template text and a resolved graph
#[derive(Debug, Error)]
pub enum Error {
    /// Error during analysis of template text
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Sandbox or guard violation while interpreting a tree
    #[error("interpret error: {0}")]
    Interpret(#[from] InterpretError),

    /// Error while binding or initializing a template
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Error while loading a context document
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// Error while writing a value back out as text
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

impl From<Vec<ParseError>> for Error {
    fn from(errors: Vec<ParseError>) -> Self {
        Error::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse, interpret and resolve template text in one go
pub fn resolve_text(text: &str, context: &Value) -> Result<Layer, Error> {
    let template = Template::parse(text)?;
    Ok(template.resolve(context)?)
}

/// Like [`resolve_text`], with custom interpreter limits
///
/// # Example
///
/// ```rust
/// use imagestack::{resolve_text_with_config, InterpreterConfig, Limits, Value};
///
/// let config = InterpreterConfig::default().with_limits(Limits::default().with_max_string_len(4));
/// let result = resolve_text_with_config("TextLayer(text='hello')", &Value::None, &config);
/// assert!(result.is_err());
/// ```
pub fn resolve_text_with_config(
    text: &str,
    context: &Value,
    config: &InterpreterConfig,
) -> Result<Layer, Error> {
    let template = Template::parse_with_config(text, config)?;
    Ok(template.resolve(context)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_simple_stack() {
        let layer = resolve_text("ImageStack()", &Value::None).unwrap();
        assert_eq!(layer.kind(), ObjectKind::ImageStack);
    }

    #[test]
    fn test_error_stages() {
        assert!(matches!(resolve_text("ImageStack(", &Value::None), Err(Error::Parse(_))));
        assert!(matches!(resolve_text("os()", &Value::None), Err(Error::Interpret(_))));
        assert!(matches!(
            resolve_text("TextLayer(text=Variable('missing'))", &Value::None),
            Err(Error::Resolve(_))
        ));
    }

    #[test]
    fn test_parse_errors_are_joined() {
        let err = Error::Parse(vec![
            ParseError::syntax(0..1, "first"),
            ParseError::syntax(2..3, "second"),
        ]);
        let message = err.to_string();
        assert!(message.contains("first"));
        assert!(message.contains("; "));
    }
}
