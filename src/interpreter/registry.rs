//! The closed set of types constructible from template text

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::color::{Color, Gradient};
use crate::interpreter::arguments::{Arguments, Signature};
use crate::interpreter::error::InterpretError;
use crate::object::{Object, ObjectKind};
use crate::value::Value;
use crate::variables::{Key, Variable};

/// A registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constructible {
    Object(ObjectKind),
    SingleColor,
    LinearGradientColor,
    Variable,
    LengthVariable,
    IteratorVariable,
    SingleColorVariable,
    EqualityVariable,
    FormattedVariables,
}

const SINGLE_COLOR: Signature = Signature::new("SingleColor", &["color"], 1);
const GRADIENT: Signature = Signature::new("LinearGradientColor", &["color1", "color2", "axis"], 2);
const VARIABLE: Signature = Signature::new("Variable", &["key"], 0);
const LENGTH: Signature = Signature::new("LengthVariable", &["key"], 0);
const ITERATOR: Signature = Signature::new("IteratorVariable", &["key"], 0);
const COLOR_VARIABLE: Signature = Signature::new("SingleColorVariable", &["key"], 1);
const EQUALITY: Signature = Signature::new(
    "EqualityVariable",
    &["key", "compare", "on_equals", "on_greater", "on_smaller"],
    4,
);
const FORMATTED: Signature = Signature::new("FormattedVariables", &["keys", "vformat"], 2);

fn key_argument(callee: &str, value: Option<Value>) -> Result<Key, InterpretError> {
    Key::try_from(value.unwrap_or_default())
        .map_err(|e| InterpretError::invalid_arguments(callee, e.to_string()))
}

impl Constructible {
    /// Invoke the constructor with evaluated arguments
    pub fn construct(self, args: Arguments) -> Result<Value, InterpretError> {
        match self {
            Constructible::Object(kind) => construct_object(kind, args).map(Value::from),
            Constructible::SingleColor => {
                let mut bound = args.bind(&SINGLE_COLOR)?;
                Ok(Color::from_value(&bound.required(0)?)?.into())
            }
            Constructible::LinearGradientColor => {
                let mut bound = args.bind(&GRADIENT)?;
                let color1 = bound.required(0)?;
                let color2 = bound.required(1)?;
                let axis = match bound.take(2) {
                    None => 0,
                    Some(axis) => axis.as_i64().ok_or_else(|| {
                        InterpretError::invalid_arguments(GRADIENT.callee, "axis must be an integer")
                    })?,
                };
                Ok(Gradient::new(color1, color2, axis)?.into())
            }
            Constructible::Variable => {
                let mut bound = args.bind(&VARIABLE)?;
                Ok(Variable::path(key_argument(VARIABLE.callee, bound.take(0))?).into())
            }
            Constructible::LengthVariable => {
                let mut bound = args.bind(&LENGTH)?;
                Ok(Variable::length(key_argument(LENGTH.callee, bound.take(0))?).into())
            }
            Constructible::IteratorVariable => {
                let mut bound = args.bind(&ITERATOR)?;
                Ok(Variable::iterator(key_argument(ITERATOR.callee, bound.take(0))?).into())
            }
            Constructible::SingleColorVariable => {
                let mut bound = args.bind(&COLOR_VARIABLE)?;
                let key = key_argument(COLOR_VARIABLE.callee, Some(bound.required(0)?))?;
                Ok(Variable::color(key).into())
            }
            Constructible::EqualityVariable => {
                let mut bound = args.bind(&EQUALITY)?;
                let key = key_argument(EQUALITY.callee, Some(bound.required(0)?))?;
                let compare = bound.required(1)?;
                let on_equal = bound.required(2)?;
                let on_greater = bound.required(3)?;
                let on_smaller = bound.take(4).filter(|v| !v.is_none());
                Ok(Variable::equality(key, compare, on_equal, on_greater, on_smaller).into())
            }
            Constructible::FormattedVariables => {
                let mut bound = args.bind(&FORMATTED)?;
                let keys = match bound.required(0)? {
                    Value::List(items) | Value::Tuple(items) => items
                        .into_iter()
                        .map(|key| key_argument(FORMATTED.callee, Some(key)))
                        .collect::<Result<Vec<_>, _>>()?,
                    other => {
                        return Err(InterpretError::invalid_arguments(
                            FORMATTED.callee,
                            format!("keys must be a list or tuple, not '{}'", other.type_name()),
                        ))
                    }
                };
                let template = match bound.required(1)? {
                    Value::Str(s) => s,
                    other => {
                        return Err(InterpretError::invalid_arguments(
                            FORMATTED.callee,
                            format!("vformat must be a string, not '{}'", other.type_name()),
                        ))
                    }
                };
                Ok(Variable::formatted_parts(keys, template).into())
            }
        }
    }
}

/// Layers and stacks keep their keyword arguments unread until resolution
fn construct_object(kind: ObjectKind, args: Arguments) -> Result<Object, InterpretError> {
    let Arguments {
        mut positional,
        keywords,
    } = args;
    let mut object = Object {
        kind,
        kwargs: keywords,
    };
    if positional.is_empty() {
        return Ok(object);
    }
    if !kind.accepts_positional() {
        return Err(InterpretError::invalid_arguments(
            kind.name(),
            format!("takes no positional arguments but {} were given", positional.len()),
        ));
    }
    if object.kwargs.contains("layers") {
        return Err(InterpretError::invalid_arguments(
            kind.name(),
            "got multiple values for argument 'layers'",
        ));
    }
    let layers = match positional.len() {
        1 => match positional.remove(0) {
            list @ Value::List(_) => list,
            single => Value::List(vec![single]),
        },
        _ => Value::List(positional),
    };
    object.kwargs.insert("layers", layers);
    Ok(object)
}

/// Name to type mapping for the sandbox
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<&'static str, Constructible>,
}

impl Registry {
    fn build() -> Self {
        let mut entries: HashMap<&'static str, Constructible> = ObjectKind::ALL
            .iter()
            .map(|kind| (kind.name(), Constructible::Object(*kind)))
            .collect();
        entries.insert("SingleColor", Constructible::SingleColor);
        entries.insert("LinearGradientColor", Constructible::LinearGradientColor);
        entries.insert("Variable", Constructible::Variable);
        entries.insert("LengthVariable", Constructible::LengthVariable);
        entries.insert("IteratorVariable", Constructible::IteratorVariable);
        entries.insert("SingleColorVariable", Constructible::SingleColorVariable);
        entries.insert("ColorVariable", Constructible::SingleColorVariable);
        entries.insert("EqualityVariable", Constructible::EqualityVariable);
        entries.insert("FormattedVariables", Constructible::FormattedVariables);
        Self { entries }
    }

    /// Process-wide registry, read-only once built
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    pub fn get(&self, name: &str) -> Option<Constructible> {
        self.entries.get(name).copied()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whether a value's concrete type is one the registry constructs
    pub fn admits(&self, value: &Value) -> bool {
        matches!(
            value,
            Value::Color(_) | Value::Gradient(_) | Value::Object(_) | Value::Variable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, positional: Vec<Value>, keywords: &[(&str, Value)]) -> Result<Value, InterpretError> {
        let entry = Registry::global().get(name).expect("registered");
        entry.construct(Arguments::new(positional, keywords.iter().cloned().collect()))
    }

    #[test]
    fn test_registry_is_closed() {
        let registry = Registry::global();
        assert!(registry.get("ImageStack").is_some());
        assert_eq!(registry.get("ColorVariable"), registry.get("SingleColorVariable"));
        assert!(registry.get("open").is_none());
        assert!(registry.get("FileImageLayer").is_none());
        assert_eq!(registry.names().len(), 22);
    }

    #[test]
    fn test_admits_only_registry_types() {
        let registry = Registry::global();
        assert!(registry.admits(&Value::Color(Color::TRANSPARENT)));
        assert!(registry.admits(&Object::new(ObjectKind::TextLayer).into()));
        assert!(!registry.admits(&Value::from("text")));
        assert!(!registry.admits(&Value::List(vec![])));
    }

    #[test]
    fn test_stack_positional_layers() {
        let layer = Value::from(Object::new(ObjectKind::EmptyLayer));
        let stack = call("ImageStack", vec![layer.clone(), layer.clone()], &[]).expect("stack");
        match stack {
            Value::Object(object) => assert_eq!(
                object.kwargs.get("layers"),
                Some(&Value::List(vec![layer.clone(), layer.clone()]))
            ),
            other => panic!("Expected object, got {:?}", other),
        }

        let single = call("ImageStack", vec![layer.clone()], &[]).expect("stack");
        match single {
            Value::Object(object) => assert_eq!(
                object.kwargs.get("layers"),
                Some(&Value::List(vec![layer.clone()]))
            ),
            other => panic!("Expected object, got {:?}", other),
        }

        assert!(call("ImageStack", vec![layer.clone()], &[("layers", Value::List(vec![]))]).is_err());
    }

    #[test]
    fn test_layers_reject_positionals() {
        let err = call("TextLayer", vec![Value::from("hi")], &[]).unwrap_err();
        assert!(matches!(err, InterpretError::InvalidArguments { .. }));
    }

    #[test]
    fn test_color_constructors() {
        assert_eq!(
            call("SingleColor", vec![Value::from((1, 2, 3))], &[]),
            Ok(Value::Color(Color::rgba(1.0, 2.0, 3.0, 255.0)))
        );
        let gradient = call(
            "LinearGradientColor",
            vec![Value::from((0, 0, 0)), Value::from((255, 255, 255))],
            &[("axis", Value::Int(1))],
        )
        .expect("gradient");
        assert!(matches!(gradient, Value::Gradient(ref g) if g.axis == 1));
        assert!(call("LinearGradientColor", vec![Value::from((0, 0, 0))], &[]).is_err());
    }

    #[test]
    fn test_variable_constructors() {
        assert_eq!(
            call("Variable", vec![], &[]),
            Ok(Variable::path(Key::identity()).into())
        );
        assert_eq!(
            call("LengthVariable", vec![Value::from("users")], &[]),
            Ok(Variable::length("users").into())
        );
        assert!(call("SingleColorVariable", vec![], &[]).is_err());
        assert!(call("Variable", vec![Value::Float(1.5)], &[]).is_err());

        let formatted = call(
            "FormattedVariables",
            vec![Value::from(("a", "b")), Value::from("{} {}")],
            &[],
        )
        .expect("formatted");
        assert!(matches!(formatted, Value::Variable(ref v) if v.type_name() == "FormattedVariables"));
    }

    #[test]
    fn test_equality_none_smaller_means_absent() {
        let value = call(
            "EqualityVariable",
            vec![Value::from("level"), Value::Int(5), Value::from("eq"), Value::from("gt")],
            &[("on_smaller", Value::None)],
        )
        .expect("equality");
        assert_eq!(
            value,
            Variable::equality("level", 5, "eq", "gt", None).into()
        );
    }
}
