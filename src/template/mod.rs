//! Templates: object graphs with deferred variables, resolved per context
//!
//! A [`Template`] is built once, from text or in code, and never changes
//! afterwards. Each call to [`Template::resolve`] works on its own deep copy,
//! so resolutions are independent of each other.
//!
//! # Example
//!
//! ```rust
//! use imagestack::{Template, Value};
//!
//! let template = Template::parse(
//!     "ImageStack(TextLayer(text=Variable('name').formatted('Hi {}')))",
//! ).unwrap();
//!
//! let context: Value = [("name", "ada")].into_iter().collect();
//! let stack = template.resolve(&context).unwrap();
//! assert_eq!(stack.text_lines(), vec!["Hi ada"]);
//! ```

mod error;
mod resolver;

use std::fmt;

use tracing::debug;

use crate::config::InterpreterConfig;
use crate::interpreter::interpret_with_config;
use crate::layers::Layer;
use crate::parser::analyse;
use crate::value::Value;

pub use error::ResolveError;
pub use resolver::{bind_value, resolve};

/// A reusable, possibly variable-bearing object graph
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Value,
    source: Option<String>,
}

impl Template {
    /// Wrap an object graph built in code
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            root: root.into(),
            source: None,
        }
    }

    /// Parse and interpret template text with default limits
    pub fn parse(text: &str) -> Result<Self, crate::Error> {
        Self::parse_with_config(text, &InterpreterConfig::default())
    }

    /// Parse and interpret template text with custom configuration
    pub fn parse_with_config(text: &str, config: &InterpreterConfig) -> Result<Self, crate::Error> {
        let tree = analyse(text)?;
        let root = interpret_with_config(&tree, config)?;
        debug!(nodes = tree.len(), "built template from text");
        Ok(Self {
            root,
            source: Some(text.to_string()),
        })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Text the template was parsed from, if any
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Resolve against a context; use `&Value::None` when there is none
    pub fn resolve(&self, context: &Value) -> Result<Layer, ResolveError> {
        resolve(&self.root, context)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(text) => write!(f, "{}", text),
            None => match crate::source::to_source(&self.root) {
                Ok(text) => write!(f, "{}", text),
                Err(_) => write!(f, "<{} template>", self.root.type_name()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Object, ObjectKind};
    use crate::variables::Variable;

    #[test]
    fn test_parse_keeps_source() {
        let template = Template::parse("ImageStack()").expect("should parse");
        assert_eq!(template.source(), Some("ImageStack()"));
        assert_eq!(template.to_string(), "ImageStack()");
    }

    #[test]
    fn test_display_falls_back_to_serializer() {
        let template = Template::new(Object::new(ObjectKind::EmptyLayer).with("resize", (2, 2)));
        assert_eq!(template.to_string(), "EmptyLayer(resize=(2, 2))");
    }

    #[test]
    fn test_parse_errors_surface() {
        assert!(matches!(
            Template::parse("ImageStack("),
            Err(crate::Error::Parse(_))
        ));
        assert!(matches!(
            Template::parse("Nope()"),
            Err(crate::Error::Interpret(_))
        ));
    }

    #[test]
    fn test_template_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
    }

    #[test]
    fn test_resolve_without_context() {
        let template = Template::new(
            Object::new(ObjectKind::TextLayer).with("text", Variable::path("name")),
        );
        assert!(matches!(
            template.resolve(&Value::None),
            Err(ResolveError::MissingContext { .. })
        ));
    }
}
