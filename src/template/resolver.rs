//! Template resolution: copy, bind every variable, then initialize

use tracing::{debug, trace};

use crate::layers::{self, Layer};
use crate::value::Value;

use super::error::ResolveError;

/// Bind every variable reachable from `value` against `context`.
///
/// Sequences, mappings, gradients and the keyword arguments of nested
/// objects are walked; a variable is bound instead of descended into.
pub fn bind_value(value: &mut Value, context: &Value) -> Result<(), ResolveError> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            for item in items {
                bind_value(item, context)?;
            }
        }
        Value::Map(map) => {
            for item in map.values_mut() {
                bind_value(item, context)?;
            }
        }
        Value::Object(object) => {
            trace!(object = %object.kind, "binding keyword arguments");
            for item in object.kwargs.values_mut() {
                bind_value(item, context)?;
            }
        }
        Value::Gradient(gradient) => {
            bind_value(&mut gradient.color1, context)?;
            bind_value(&mut gradient.color2, context)?;
        }
        Value::Variable(variable) => variable.bind(context)?,
        Value::None
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Str(_)
        | Value::Color(_)
        | Value::Method(_) => {}
    }
    Ok(())
}

/// Resolve a template value against a context.
///
/// The template itself is never touched: resolution works on a private deep
/// copy, so the same template can be resolved repeatedly or from several
/// threads at once.
pub fn resolve(template: &Value, context: &Value) -> Result<Layer, ResolveError> {
    let mut copy = template.clone();
    bind_value(&mut copy, context)?;

    let mut root = match copy {
        Value::Object(root) => root,
        other => return Err(ResolveError::NotAnObject(other.type_name())),
    };
    let layer = layers::initialize(&mut root)?;
    debug!(root = %root.kind, "resolved template");
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Object, ObjectKind};
    use crate::variables::Variable;

    #[test]
    fn test_bind_walks_nested_containers() {
        let mut value = Value::List(vec![
            Value::Tuple(vec![Variable::path("a").into()]),
            Object::new(ObjectKind::TextLayer)
                .with("text", Variable::path("b"))
                .into(),
            [("k", Value::from(Variable::path("a")))].into_iter().collect(),
        ]);
        let context: Value = [("a", 1), ("b", 2)].into_iter().collect();
        bind_value(&mut value, &context).expect("should bind");

        let mut bound = 0;
        fn count(value: &Value, bound: &mut usize) {
            match value {
                Value::Variable(v) => {
                    assert!(v.is_bound());
                    *bound += 1;
                }
                Value::List(items) | Value::Tuple(items) => {
                    items.iter().for_each(|i| count(i, bound))
                }
                Value::Map(map) => map.values().for_each(|i| count(i, bound)),
                Value::Object(o) => o.kwargs.iter().for_each(|(_, i)| count(i, bound)),
                _ => {}
            }
        }
        count(&value, &mut bound);
        assert_eq!(bound, 3);
    }

    #[test]
    fn test_template_untouched_by_resolution() {
        let template: Value = Object::new(ObjectKind::TextLayer)
            .with("text", Variable::path("name"))
            .into();
        let before = template.clone();
        let context: Value = [("name", "ada")].into_iter().collect();
        resolve(&template, &context).expect("should resolve");
        assert_eq!(template, before);
    }

    #[test]
    fn test_root_must_be_object() {
        assert_eq!(
            resolve(&Value::Int(1), &Value::None),
            Err(ResolveError::NotAnObject("int".into()))
        );
    }
}
