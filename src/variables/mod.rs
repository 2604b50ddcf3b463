//! Deferred values bound against a context at resolution time
//!
//! A [`Variable`] is a small state machine: it is created unbound inside a
//! template, receives the context once through [`Variable::bind`] and then
//! answers [`Variable::value`]. Iterators advance on every read. State is
//! only ever reset by cloning the template, never in place.

mod format;
mod key;

use std::cmp::Ordering;

use tracing::trace;

use crate::color::Color;
use crate::template::{bind_value, ResolveError};
use crate::value::{OperandError, Value};

pub use format::{format, FormatError};
pub use key::{InvalidKey, Key, KeyToken};

/// An operation recorded on a variable, replayed after binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Index,
    Lightened,
    Darkened,
    Alpha,
}

impl OperationKind {
    pub fn is_color_method(self) -> bool {
        matches!(
            self,
            OperationKind::Lightened | OperationKind::Darkened | OperationKind::Alpha
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    /// May itself hold variables; bound with the same context
    pub arg: Value,
}

impl Operation {
    fn apply(&self, current: Value, arg: Value) -> Result<Value, OperandError> {
        let factor = || {
            arg.as_f64().ok_or_else(|| OperandError::TypeMismatch {
                op: "color method",
                left: "SingleColor".to_string(),
                right: arg.type_name(),
            })
        };
        match self.kind {
            OperationKind::Add => current.add(&arg),
            OperationKind::Sub => current.sub(&arg),
            // Replayed without interpreter config, so the default limits apply
            OperationKind::Mul => current.mul(&arg),
            OperationKind::Div => current.div(&arg),
            OperationKind::FloorDiv => current.floor_div(&arg),
            OperationKind::Index => current.index(&arg),
            OperationKind::Lightened => {
                Ok(Color::from_value(&current)?.lightened(factor()?).into())
            }
            OperationKind::Darkened => Ok(Color::from_value(&current)?.darkened(factor()?).into()),
            OperationKind::Alpha => Ok(Color::from_value(&current)?.alpha(factor()?).into()),
        }
    }
}

/// Cursor over a bound sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IteratorState {
    pub items: Vec<Value>,
    pub cursor: usize,
    /// Looked up inside each element before it becomes the value
    pub each: Key,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EqualityBranches {
    pub compare: Value,
    pub on_equal: Value,
    pub on_greater: Value,
    pub on_smaller: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    /// Plain lookup
    Path,
    /// Length of the looked-up collection
    Length,
    /// Looked-up value coerced to a color
    Color,
    Iterator(IteratorState),
    Equality(Box<EqualityBranches>),
    /// Several lookups substituted into one format template
    Formatted { parts: Vec<Variable>, template: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub key: Key,
    pub kind: VariableKind,
    pub operations: Vec<Operation>,
    /// Applied in order to the produced value
    pub formatters: Vec<String>,
    bound: Option<Value>,
}

impl Variable {
    fn with_kind(key: Key, kind: VariableKind) -> Self {
        Self {
            key,
            kind,
            operations: Vec::new(),
            formatters: Vec::new(),
            bound: None,
        }
    }

    pub fn path(key: impl Into<Key>) -> Self {
        Self::with_kind(key.into(), VariableKind::Path)
    }

    pub fn length(key: impl Into<Key>) -> Self {
        Self::with_kind(key.into(), VariableKind::Length)
    }

    pub fn color(key: impl Into<Key>) -> Self {
        Self::with_kind(key.into(), VariableKind::Color)
    }

    pub fn iterator(key: impl Into<Key>) -> Self {
        Self::with_kind(key.into(), VariableKind::Iterator(IteratorState::default()))
    }

    pub fn equality(
        key: impl Into<Key>,
        compare: impl Into<Value>,
        on_equal: impl Into<Value>,
        on_greater: impl Into<Value>,
        on_smaller: Option<Value>,
    ) -> Self {
        Self::with_kind(
            key.into(),
            VariableKind::Equality(Box::new(EqualityBranches {
                compare: compare.into(),
                on_equal: on_equal.into(),
                on_greater: on_greater.into(),
                on_smaller,
            })),
        )
    }

    pub fn formatted_parts(keys: Vec<Key>, template: impl Into<String>) -> Self {
        Self::with_kind(
            Key::identity(),
            VariableKind::Formatted {
                parts: keys.into_iter().map(Variable::path).collect(),
                template: template.into(),
            },
        )
    }

    /// Name of the constructor that builds this variant
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            VariableKind::Path => "Variable",
            VariableKind::Length => "LengthVariable",
            VariableKind::Color => "SingleColorVariable",
            VariableKind::Iterator(_) => "IteratorVariable",
            VariableKind::Equality(_) => "EqualityVariable",
            VariableKind::Formatted { .. } => "FormattedVariables",
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Record an operation to replay after binding
    pub fn push_operation(&mut self, kind: OperationKind, arg: impl Into<Value>) {
        self.operations.push(Operation {
            kind,
            arg: arg.into(),
        });
    }

    fn recorded(mut self, kind: OperationKind, arg: impl Into<Value>) -> Self {
        self.push_operation(kind, arg);
        self
    }

    pub fn add(self, arg: impl Into<Value>) -> Self {
        self.recorded(OperationKind::Add, arg)
    }

    pub fn sub(self, arg: impl Into<Value>) -> Self {
        self.recorded(OperationKind::Sub, arg)
    }

    pub fn mul(self, arg: impl Into<Value>) -> Self {
        self.recorded(OperationKind::Mul, arg)
    }

    pub fn div(self, arg: impl Into<Value>) -> Self {
        self.recorded(OperationKind::Div, arg)
    }

    pub fn floor_div(self, arg: impl Into<Value>) -> Self {
        self.recorded(OperationKind::FloorDiv, arg)
    }

    pub fn index(self, arg: impl Into<Value>) -> Self {
        self.recorded(OperationKind::Index, arg)
    }

    pub fn lightened(self, factor: f64) -> Self {
        self.recorded(OperationKind::Lightened, factor)
    }

    pub fn darkened(self, factor: f64) -> Self {
        self.recorded(OperationKind::Darkened, factor)
    }

    pub fn alpha(self, alpha: f64) -> Self {
        self.recorded(OperationKind::Alpha, alpha)
    }

    /// Format the produced value with `template`
    pub fn formatted(mut self, template: impl Into<String>) -> Self {
        self.formatters.push(template.into());
        self
    }

    /// Set the per-element sub-key of an iterator; `None` for other kinds
    pub fn each(mut self, key: Key) -> Option<Self> {
        match &mut self.kind {
            VariableKind::Iterator(state) => {
                state.each = key;
                Some(self)
            }
            _ => None,
        }
    }

    /// Bind against the context, replacing any earlier binding
    pub fn bind(&mut self, context: &Value) -> Result<(), ResolveError> {
        trace!(variable = self.type_name(), key = %self.key, "binding variable");
        for operation in &mut self.operations {
            bind_value(&mut operation.arg, context)?;
        }

        match &mut self.kind {
            VariableKind::Path => {
                let value = self.key.lookup(context)?;
                self.set_value(value)
            }
            VariableKind::Length => {
                let found = self.key.lookup(context)?;
                let len = found.len().map_err(|source| ResolveError::MissingContext {
                    key: self.key.to_string(),
                    source,
                })?;
                self.set_value(Value::Int(len as i64))
            }
            VariableKind::Color => {
                let found = self.key.lookup(context)?;
                let color = Color::from_value(&found)?;
                self.set_value(color.into())
            }
            VariableKind::Iterator(state) => {
                let found = self.key.lookup(context)?;
                state.items = match found {
                    Value::List(items) | Value::Tuple(items) => items,
                    Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
                    other => {
                        return Err(ResolveError::MissingContext {
                            key: self.key.to_string(),
                            source: OperandError::NoLength(other.type_name()),
                        })
                    }
                };
                state.cursor = 0;
                self.bound = Some(Value::None);
                Ok(())
            }
            VariableKind::Equality(branches) => {
                bind_value(&mut branches.compare, context)?;
                bind_value(&mut branches.on_equal, context)?;
                bind_value(&mut branches.on_greater, context)?;
                if let Some(on_smaller) = &mut branches.on_smaller {
                    bind_value(on_smaller, context)?;
                }
                let value = self.key.lookup(context)?;
                self.set_value(value)
            }
            VariableKind::Formatted { parts, .. } => {
                for part in parts.iter_mut() {
                    part.bind(context)?;
                }
                self.bound = Some(Value::None);
                Ok(())
            }
        }
    }

    /// Store a looked-up value, replaying the recorded operations on it
    fn set_value(&mut self, value: Value) -> Result<(), ResolveError> {
        let mut current = value;
        for operation in &mut self.operations {
            let arg = evaluate(&mut operation.arg)?;
            current = operation.apply(current, arg)?;
        }
        self.bound = Some(current);
        Ok(())
    }

    /// Current value; advances iterators
    pub fn value(&mut self) -> Result<Value, ResolveError> {
        if self.bound.is_none() {
            return Err(ResolveError::Unbound {
                variable: format!("{}({})", self.type_name(), self.key),
            });
        }

        let produced = match &mut self.kind {
            VariableKind::Iterator(state) => {
                if state.cursor < state.items.len() {
                    let element = state.items[state.cursor].clone();
                    let value = state.each.lookup(&element)?;
                    state.cursor += 1;
                    self.set_value(value)?;
                }
                self.bound.clone().unwrap_or_default()
            }
            VariableKind::Equality(branches) => {
                // Branch selection; formatters do not apply here
                let bound = self.bound.clone().unwrap_or_default();
                let compare = evaluate(&mut branches.compare)?;
                let branch = if bound.loose_eq(&compare) {
                    &mut branches.on_equal
                } else {
                    match &mut branches.on_smaller {
                        None => &mut branches.on_greater,
                        Some(_) if bound.compare(&compare)? == Ordering::Greater => {
                            &mut branches.on_greater
                        }
                        Some(on_smaller) => on_smaller,
                    }
                };
                return evaluate(branch);
            }
            VariableKind::Formatted { parts, template } => {
                let values = parts
                    .iter_mut()
                    .map(Variable::value)
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Str(format(template, &values)?)
            }
            VariableKind::Path | VariableKind::Length | VariableKind::Color => {
                self.bound.clone().unwrap_or_default()
            }
        };

        let mut value = produced;
        for template in &self.formatters {
            value = Value::Str(format(template, &[value])?);
        }
        Ok(value)
    }
}

/// Concrete value of `value`, reading any variables inside sequences and
/// gradients
pub fn evaluate(value: &mut Value) -> Result<Value, ResolveError> {
    match value {
        Value::Variable(variable) => variable.value(),
        Value::List(items) => Ok(Value::List(
            items.iter_mut().map(evaluate).collect::<Result<_, _>>()?,
        )),
        Value::Tuple(items) => Ok(Value::Tuple(
            items.iter_mut().map(evaluate).collect::<Result<_, _>>()?,
        )),
        Value::Gradient(gradient) => {
            let mut resolved = (**gradient).clone();
            resolved.color1 = evaluate(&mut gradient.color1)?;
            resolved.color2 = evaluate(&mut gradient.color2)?;
            Ok(resolved.into())
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> Value {
        serde_json::json!({
            "name": "ada",
            "level": 5,
            "progress": 0.25,
            "users": [
                {"name": "ada", "color": [255, 0, 0]},
                {"name": "bob", "color": [0, 255, 0]},
                {"name": "cy", "color": [0, 0, 255]}
            ],
            "accent": [10, 20, 30]
        })
        .into()
    }

    fn bound(mut variable: Variable) -> Variable {
        variable.bind(&context()).expect("should bind");
        variable
    }

    #[test]
    fn test_path_and_operations() {
        let mut variable = bound(Variable::path("level").mul(2).add(1));
        assert_eq!(variable.value(), Ok(Value::Int(11)));
    }

    #[test]
    fn test_operation_argument_can_be_variable() {
        let mut variable = bound(Variable::path("level").add(Variable::path("level")));
        assert_eq!(variable.value(), Ok(Value::Int(10)));
    }

    #[test]
    fn test_index_and_division_operations() {
        let mut variable = bound(Variable::path("users").index(-1).index("name"));
        assert_eq!(variable.value(), Ok(Value::from("cy")));

        let mut variable = bound(Variable::path("level").div(2));
        assert_eq!(variable.value(), Ok(Value::Float(2.5)));

        let mut variable = bound(Variable::path("level").floor_div(2));
        assert_eq!(variable.value(), Ok(Value::Int(2)));
    }

    #[test]
    fn test_formatted() {
        let mut variable = bound(Variable::path("progress").mul(100).formatted("{:.0f}%"));
        assert_eq!(variable.value(), Ok(Value::from("25%")));

        let mut variable = bound(Variable::path("name").formatted("Hi {}").formatted("[{}]"));
        assert_eq!(variable.value(), Ok(Value::from("[Hi ada]")));
    }

    #[test]
    fn test_replayed_repetition_is_bounded() {
        let mut variable = Variable::path("name").mul(Variable::path("count"));
        let context: Value = serde_json::json!({"name": "ada", "count": 1_i64 << 62}).into();
        assert!(matches!(
            variable.bind(&context),
            Err(ResolveError::Operation(OperandError::TooLong { .. }))
        ));
    }

    #[test]
    fn test_huge_format_width_fails() {
        let mut variable = bound(Variable::path("name").formatted("{:18446744073709551615}"));
        assert!(matches!(
            variable.value(),
            Err(ResolveError::Format(FormatError::InvalidSpec(_)))
        ));
    }

    #[test]
    fn test_unbound_read_fails() {
        let mut variable = Variable::path("name");
        assert!(matches!(variable.value(), Err(ResolveError::Unbound { .. })));
    }

    #[test]
    fn test_length() {
        let mut variable = bound(Variable::length("users"));
        assert_eq!(variable.value(), Ok(Value::Int(3)));

        let mut not_sized = Variable::length("level");
        assert!(matches!(
            not_sized.bind(&context()),
            Err(ResolveError::MissingContext { .. })
        ));
    }

    #[test]
    fn test_color_variable() {
        let mut variable = bound(Variable::color("accent").lightened(2.0).alpha(100.0));
        assert_eq!(
            variable.value(),
            Ok(Value::Color(Color::rgba(20.0, 40.0, 60.0, 100.0)))
        );
    }

    #[test]
    fn test_iterator_advances_then_sticks() {
        let mut variable = Variable::iterator("users")
            .each(Key::name("name"))
            .expect("iterator");
        variable.bind(&context()).expect("should bind");
        assert_eq!(variable.value(), Ok(Value::from("ada")));
        assert_eq!(variable.value(), Ok(Value::from("bob")));
        assert_eq!(variable.value(), Ok(Value::from("cy")));
        assert_eq!(variable.value(), Ok(Value::from("cy")));
    }

    #[test]
    fn test_iterator_without_subkey_yields_elements() {
        let mut variable = bound(Variable::iterator(Key::try_from(Value::from(("users", 0, "color"))).expect("key")));
        assert_eq!(variable.value(), Ok(Value::Int(255)));
        assert_eq!(variable.value(), Ok(Value::Int(0)));
    }

    #[test]
    fn test_iterator_over_empty_sequence_is_none() {
        let mut variable = Variable::iterator(Key::identity());
        variable.bind(&Value::List(vec![])).expect("should bind");
        assert_eq!(variable.value(), Ok(Value::None));
    }

    #[test]
    fn test_each_only_on_iterators() {
        assert!(Variable::path("a").each(Key::identity()).is_none());
    }

    fn equality(level: i64, with_smaller: bool) -> Value {
        let mut variable = Variable::equality(
            Key::identity(),
            5,
            "equal",
            "greater",
            with_smaller.then(|| Value::from("smaller")),
        );
        variable.bind(&Value::Int(level)).expect("should bind");
        variable.value().expect("should select")
    }

    #[test]
    fn test_equality_branch_selection() {
        assert_eq!(equality(5, false), Value::from("equal"));
        assert_eq!(equality(7, false), Value::from("greater"));
        assert_eq!(equality(3, true), Value::from("smaller"));
        assert_eq!(equality(3, false), Value::from("greater"));
        assert_eq!(equality(7, true), Value::from("greater"));
    }

    #[test]
    fn test_equality_binds_branch_variables() {
        let mut variable = Variable::equality(
            "level",
            5,
            Variable::path("name").formatted("{} maxed"),
            Value::None,
            None,
        );
        variable.bind(&context()).expect("should bind");
        assert_eq!(variable.value(), Ok(Value::from("ada maxed")));
    }

    #[test]
    fn test_formatted_parts() {
        let mut variable = bound(Variable::formatted_parts(
            vec![Key::name("name"), Key::name("level")],
            "{} is level {}",
        ));
        assert_eq!(variable.value(), Ok(Value::from("ada is level 5")));
    }

    #[test]
    fn test_failed_operation_reports_operand_error() {
        let mut variable = Variable::path("name").sub(1);
        assert!(matches!(
            variable.bind(&context()),
            Err(ResolveError::Operation(_))
        ));
    }
}
