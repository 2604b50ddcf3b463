//! Lookup paths into a resolution context

use std::fmt;

use thiserror::Error;

use crate::template::ResolveError;
use crate::value::{OperandError, Value};
use crate::variables::Variable;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("a variable key must be a name, an index, a variable or a sequence of those, not '{0}'")]
pub struct InvalidKey(pub String);

/// One step of a lookup path
#[derive(Debug, Clone, PartialEq)]
pub enum KeyToken {
    /// Field or mapping key
    Name(String),
    /// Sequence index, negative counts from the end
    Index(i64),
    /// Bound against the current value; its value is the result
    Variable(Box<Variable>),
}

/// Lookup path applied left to right; empty means the context itself
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Key(Vec<KeyToken>);

impl Key {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self(vec![KeyToken::Name(name.into())])
    }

    pub fn path(tokens: Vec<KeyToken>) -> Self {
        Self(tokens)
    }

    pub fn tokens(&self) -> &[KeyToken] {
        &self.0
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_empty()
    }

    /// Walk the path from `value`
    pub fn lookup(&mut self, value: &Value) -> Result<Value, ResolveError> {
        let description = self.to_string();
        let missing = |source: OperandError| ResolveError::MissingContext {
            key: description.clone(),
            source,
        };

        let mut current = value.clone();
        for token in &mut self.0 {
            current = match token {
                KeyToken::Name(name) => lookup_name(&current, name).map_err(missing)?,
                KeyToken::Index(index) => current.index(&Value::Int(*index)).map_err(missing)?,
                KeyToken::Variable(variable) => {
                    variable.bind(&current)?;
                    variable.value()?
                }
            };
        }
        Ok(current)
    }
}

fn lookup_name(value: &Value, name: &str) -> Result<Value, OperandError> {
    match value {
        Value::Object(object) => object
            .attribute(name)
            .cloned()
            .ok_or_else(|| OperandError::KeyNotFound(name.to_string())),
        other => other.index(&Value::Str(name.to_string())),
    }
}

impl TryFrom<Value> for KeyToken {
    type Error = InvalidKey;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(name) => Ok(KeyToken::Name(name)),
            Value::Int(index) => Ok(KeyToken::Index(index)),
            Value::Variable(variable) => Ok(KeyToken::Variable(variable)),
            other => Err(InvalidKey(other.type_name())),
        }
    }
}

impl TryFrom<Value> for Key {
    type Error = InvalidKey;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::None => Ok(Key::identity()),
            Value::List(items) | Value::Tuple(items) => items
                .into_iter()
                .map(KeyToken::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Key),
            other => Ok(Key(vec![KeyToken::try_from(other)?])),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::name(name)
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key(vec![KeyToken::Index(index)])
    }
}

impl From<Vec<KeyToken>> for Key {
    fn from(tokens: Vec<KeyToken>) -> Self {
        Key(tokens)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        let mut tokens: Vec<Value> = key
            .0
            .into_iter()
            .map(|token| match token {
                KeyToken::Name(name) => Value::Str(name),
                KeyToken::Index(index) => Value::Int(index),
                KeyToken::Variable(variable) => Value::Variable(variable),
            })
            .collect();
        match tokens.len() {
            0 => Value::None,
            1 => tokens.remove(0),
            _ => Value::List(tokens),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<context>");
        }
        for (i, token) in self.0.iter().enumerate() {
            match token {
                KeyToken::Name(name) if i == 0 => write!(f, "{}", name)?,
                KeyToken::Name(name) => write!(f, ".{}", name)?,
                KeyToken::Index(index) => write!(f, "[{}]", index)?,
                KeyToken::Variable(variable) => write!(f, "[<{}>]", variable.type_name())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Value {
        serde_json::json!({
            "user": {"name": "ada", "scores": [3, 5, 8]},
            "field": "name"
        })
        .into()
    }

    #[test]
    fn test_identity_returns_context() {
        let mut key = Key::identity();
        assert_eq!(key.lookup(&Value::Int(4)).ok(), Some(Value::Int(4)));
    }

    #[test]
    fn test_path_lookup() {
        let mut key = Key::try_from(Value::from(("user", "scores", -1))).expect("valid key");
        assert_eq!(key.lookup(&context()).ok(), Some(Value::Int(8)));
    }

    #[test]
    fn test_nested_variable_token() {
        // The nested variable reads the field name from the current value
        let inner = Variable::path(Key::name("field"));
        let mut key = Key::path(vec![KeyToken::Variable(Box::new(inner))]);
        assert_eq!(key.lookup(&context()).ok(), Some(Value::from("name")));
    }

    #[test]
    fn test_missing_key_reports_path() {
        let mut key = Key::try_from(Value::from(("user", "age"))).expect("valid key");
        match key.lookup(&context()) {
            Err(ResolveError::MissingContext { key, .. }) => assert_eq!(key, "user.age"),
            other => panic!("Expected missing context, got {:?}", other),
        }
    }

    #[test]
    fn test_index_out_of_range_is_missing_context() {
        let mut key = Key::try_from(Value::from(("user", "scores", 9))).expect("valid key");
        assert!(matches!(
            key.lookup(&context()),
            Err(ResolveError::MissingContext { .. })
        ));
    }

    #[test]
    fn test_invalid_key_type() {
        assert_eq!(
            Key::try_from(Value::Float(1.5)),
            Err(InvalidKey("float".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let key = Key::try_from(Value::from(("users", 0, "name"))).expect("valid key");
        assert_eq!(key.to_string(), "users[0].name");
    }
}
