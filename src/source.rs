//! Writing values back out as template text
//!
//! The output reads back through [`crate::analyse`] and
//! [`crate::interpret`] to an equal value. Values with no spelling in the
//! expression language are rejected rather than approximated.

use thiserror::Error;

use crate::color::Gradient;
use crate::object::Object;
use crate::value::{format_float, quote_str, Value};
use crate::variables::{Key, OperationKind, Variable, VariableKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("{0} cannot be written as template text")]
    Inexpressible(String),

    #[error("'{0}' is not a valid keyword argument name")]
    InvalidName(String),

    #[error("non-finite number {0} cannot be written as template text")]
    NonFinite(f64),
}

/// Template text that interprets back to `value`
pub fn to_source(value: &Value) -> Result<String, SourceError> {
    let mut writer = Writer::default();
    writer.value(value)?;
    Ok(writer.out)
}

#[derive(Default)]
struct Writer {
    out: String,
}

impl Writer {
    fn value(&mut self, value: &Value) -> Result<(), SourceError> {
        match value {
            Value::None => self.out.push_str("None"),
            Value::Bool(true) => self.out.push_str("True"),
            Value::Bool(false) => self.out.push_str("False"),
            Value::Int(i) => self.out.push_str(&i.to_string()),
            Value::Float(x) => self.float(*x)?,
            Value::Str(s) => self.out.push_str(&quote_str(s)),
            Value::List(items) => {
                self.out.push('[');
                self.items(items)?;
                self.out.push(']');
            }
            Value::Tuple(items) => {
                self.out.push('(');
                self.items(items)?;
                if items.len() == 1 {
                    self.out.push(',');
                }
                self.out.push(')');
            }
            Value::Color(color) => self.out.push_str(&color.to_string()),
            Value::Gradient(gradient) => self.gradient(gradient)?,
            Value::Object(object) => self.object(object)?,
            Value::Variable(variable) => self.variable(variable)?,
            Value::Map(_) => return Err(SourceError::Inexpressible("a mapping".to_string())),
            Value::Method(method) => {
                return Err(SourceError::Inexpressible(format!(
                    "method '{}' of {}",
                    method.name,
                    method.receiver.type_name()
                )))
            }
        }
        Ok(())
    }

    fn float(&mut self, x: f64) -> Result<(), SourceError> {
        if !x.is_finite() {
            return Err(SourceError::NonFinite(x));
        }
        let text = format_float(x);
        // Exponent forms need a fraction to lex as a float
        match text.split_once('e') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => {
                self.out.push_str(&format!("{}.0e{}", mantissa, exponent))
            }
            _ => self.out.push_str(&text),
        }
        Ok(())
    }

    fn items(&mut self, items: &[Value]) -> Result<(), SourceError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.value(item)?;
        }
        Ok(())
    }

    fn gradient(&mut self, gradient: &Gradient) -> Result<(), SourceError> {
        self.out.push_str("LinearGradientColor(");
        self.value(&gradient.color1)?;
        self.out.push_str(", ");
        self.value(&gradient.color2)?;
        self.out.push_str(&format!(", {})", gradient.axis));
        Ok(())
    }

    fn object(&mut self, object: &Object) -> Result<(), SourceError> {
        self.out.push_str(object.kind.name());
        self.out.push('(');
        for (i, (name, value)) in object.kwargs.iter().enumerate() {
            if !is_identifier(name) {
                return Err(SourceError::InvalidName(name.to_string()));
            }
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(name);
            self.out.push('=');
            self.value(value)?;
        }
        self.out.push(')');
        Ok(())
    }

    fn key(&mut self, key: &Key) -> Result<(), SourceError> {
        if !key.is_identity() {
            self.value(&Value::from(key.clone()))?;
        }
        Ok(())
    }

    fn variable(&mut self, variable: &Variable) -> Result<(), SourceError> {
        let start = self.out.len();
        // Whether the text so far needs parentheses before a method call
        let mut compound = false;

        match &variable.kind {
            VariableKind::Path => self.call("Variable", &variable.key)?,
            VariableKind::Length => self.call("LengthVariable", &variable.key)?,
            VariableKind::Color => {
                self.out.push_str("SingleColorVariable(");
                self.value(&Value::from(variable.key.clone()))?;
                self.out.push(')');
            }
            VariableKind::Iterator(state) => {
                self.call("IteratorVariable", &variable.key)?;
                if !state.each.is_identity() {
                    self.out.push('(');
                    self.key(&state.each)?;
                    self.out.push(')');
                }
            }
            VariableKind::Equality(branches) => {
                self.out.push_str("EqualityVariable(");
                self.value(&Value::from(variable.key.clone()))?;
                for branch in [&branches.compare, &branches.on_equal, &branches.on_greater] {
                    self.out.push_str(", ");
                    self.value(branch)?;
                }
                if let Some(on_smaller) = &branches.on_smaller {
                    self.out.push_str(", ");
                    self.value(on_smaller)?;
                }
                self.out.push(')');
            }
            VariableKind::Formatted { parts, template } => {
                self.out.push_str("FormattedVariables([");
                for (i, part) in parts.iter().enumerate() {
                    if part.kind != VariableKind::Path
                        || !part.operations.is_empty()
                        || !part.formatters.is_empty()
                    {
                        return Err(SourceError::Inexpressible(
                            "a formatted part with its own operations".to_string(),
                        ));
                    }
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.value(&Value::from(part.key.clone()))?;
                }
                self.out.push_str("], ");
                self.out.push_str(&quote_str(template));
                self.out.push(')');
            }
        }

        for operation in &variable.operations {
            let symbol = match operation.kind {
                OperationKind::Add => "+",
                OperationKind::Sub => "-",
                OperationKind::Mul => "*",
                OperationKind::Lightened | OperationKind::Darkened | OperationKind::Alpha => {
                    let name = match operation.kind {
                        OperationKind::Lightened => "lightened",
                        OperationKind::Darkened => "darkened",
                        _ => "alpha",
                    };
                    self.parenthesize_from(start, compound);
                    compound = false;
                    self.out.push_str(&format!(".{}(", name));
                    self.value(&operation.arg)?;
                    self.out.push(')');
                    continue;
                }
                OperationKind::Div | OperationKind::FloorDiv | OperationKind::Index => {
                    return Err(SourceError::Inexpressible(format!(
                        "a {:?} operation on {}",
                        operation.kind,
                        variable.type_name()
                    )))
                }
            };
            // Left-associative, so a sum followed by a product needs grouping
            if compound && operation.kind == OperationKind::Mul {
                self.parenthesize_from(start, true);
            }
            self.out.push_str(&format!(" {} ", symbol));
            self.operand(&operation.arg)?;
            compound = true;
        }

        for template in &variable.formatters {
            self.parenthesize_from(start, compound);
            compound = false;
            self.out.push_str(".formatted(");
            self.out.push_str(&quote_str(template));
            self.out.push(')');
        }
        Ok(())
    }

    fn call(&mut self, name: &str, key: &Key) -> Result<(), SourceError> {
        self.out.push_str(name);
        self.out.push('(');
        self.key(key)?;
        self.out.push(')');
        Ok(())
    }

    /// Right-hand operand; grouped when it carries its own arithmetic
    fn operand(&mut self, value: &Value) -> Result<(), SourceError> {
        let grouped = matches!(value, Value::Variable(v) if v.operations.iter().any(|op| {
            matches!(op.kind, OperationKind::Add | OperationKind::Sub | OperationKind::Mul)
        }));
        if grouped {
            self.out.push('(');
        }
        self.value(value)?;
        if grouped {
            self.out.push(')');
        }
        Ok(())
    }

    fn parenthesize_from(&mut self, start: usize, needed: bool) {
        if needed {
            self.out.insert(start, '(');
            self.out.push(')');
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    (head.is_ascii_alphabetic() || head == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(name, "True" | "False" | "None")
}
