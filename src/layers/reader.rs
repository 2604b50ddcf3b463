//! Reading bound keyword arguments into typed fields

use tracing::warn;

use crate::color::{Axis, Color, Paint};
use crate::object::Object;
use crate::template::ResolveError;
use crate::value::Value;
use crate::variables::evaluate;

/// Tracks which keyword arguments of an object were read
pub struct KwargReader<'a> {
    object: &'a mut Object,
    used: Vec<String>,
    copies: usize,
}

impl<'a> KwargReader<'a> {
    pub fn new(object: &'a mut Object) -> Self {
        Self {
            object,
            used: Vec::new(),
            copies: 1,
        }
    }

    /// Set how many times enclosing list layers initialize this object
    pub fn with_copies(mut self, copies: usize) -> Self {
        self.copies = copies;
        self
    }

    pub fn copies(&self) -> usize {
        self.copies
    }

    pub fn error(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::initialization(self.object.kind.name(), message)
    }

    fn mark(&mut self, key: &str) {
        if !self.used.iter().any(|k| k == key) {
            self.used.push(key.to_string());
        }
    }

    /// Concrete value of a keyword, if given
    pub fn get(&mut self, key: &str) -> Result<Option<Value>, ResolveError> {
        self.mark(key);
        match self.object.kwargs.get_mut(key) {
            Some(value) => Ok(Some(evaluate(value)?)),
            None => Ok(None),
        }
    }

    /// Concrete value of a keyword that has no default
    pub fn required(&mut self, key: &str) -> Result<Value, ResolveError> {
        self.get(key)?
            .ok_or_else(|| self.error(format!("\"{}\" was not found", key)))
    }

    /// The stored value itself, for nested objects that initialize in place
    pub fn raw(&mut self, key: &str) -> Option<&mut Value> {
        self.mark(key);
        self.object.kwargs.get_mut(key)
    }

    /// Replace a keyword before it is read
    pub fn set(&mut self, key: &str, value: Value) {
        self.object.kwargs.insert(key, value);
    }

    pub fn number(&mut self, key: &str, default: f64) -> Result<f64, ResolveError> {
        match self.get(key)? {
            None => Ok(default),
            Some(value) => self.to_number(key, &value),
        }
    }

    pub fn to_number(&self, key: &str, value: &Value) -> Result<f64, ResolveError> {
        value
            .as_f64()
            .ok_or_else(|| self.error(format!("{} must be a number, not '{}'", key, value.type_name())))
    }

    pub fn integer(&mut self, key: &str, default: i64) -> Result<i64, ResolveError> {
        match self.get(key)? {
            None => Ok(default),
            Some(value) => value.as_i64().ok_or_else(|| {
                self.error(format!("{} must be an integer, not '{}'", key, value.type_name()))
            }),
        }
    }

    pub fn boolean(&mut self, key: &str, default: bool) -> Result<bool, ResolveError> {
        match self.get(key)? {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(b),
            Some(other) => Err(self.error(format!(
                "{} must be True or False, not '{}'",
                key,
                other.type_name()
            ))),
        }
    }

    pub fn string(&mut self, key: &str, default: &str) -> Result<String, ResolveError> {
        match self.get(key)? {
            None => Ok(default.to_string()),
            Some(value) => self.to_string_value(key, value),
        }
    }

    pub fn to_string_value(&self, key: &str, value: Value) -> Result<String, ResolveError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(self.error(format!(
                "{} must be a string, not '{}'",
                key,
                other.type_name()
            ))),
        }
    }

    /// One of a fixed set of strings
    pub fn choice(
        &mut self,
        key: &str,
        default: &'static str,
        allowed: &[&'static str],
    ) -> Result<String, ResolveError> {
        let value = self.string(key, default)?;
        if !allowed.contains(&value.as_str()) {
            return Err(self.error(format!(
                "{} must be one of {}, not '{}'",
                key,
                allowed.join("|"),
                value
            )));
        }
        Ok(value)
    }

    pub fn pair(&mut self, key: &str, default: (f64, f64)) -> Result<(f64, f64), ResolveError> {
        match self.get(key)? {
            None => Ok(default),
            Some(value) => self.to_pair(key, &value),
        }
    }

    pub fn to_pair(&self, key: &str, value: &Value) -> Result<(f64, f64), ResolveError> {
        match value.as_seq() {
            Some([a, b]) => Ok((self.to_number(key, a)?, self.to_number(key, b)?)),
            _ => Err(self.error(format!("{} must be a pair of numbers, not {}", key, value))),
        }
    }

    /// A pair, or `False` for none
    pub fn optional_pair(&mut self, key: &str) -> Result<Option<(f64, f64)>, ResolveError> {
        match self.get(key)? {
            None | Some(Value::Bool(false)) => Ok(None),
            Some(value) => self.to_pair(key, &value).map(Some),
        }
    }

    pub fn color(&mut self, key: &str) -> Result<Color, ResolveError> {
        match self.get(key)? {
            None => Ok(Color::TRANSPARENT),
            Some(value) => Color::from_value(&value).map_err(|e| self.error(format!("{}: {}", key, e))),
        }
    }

    /// A color, a channel sequence or a gradient
    pub fn paint(&mut self, key: &str) -> Result<Paint, ResolveError> {
        let value = match self.get(key)? {
            None => return Ok(Paint::default()),
            Some(value) => value,
        };
        let color = |value: &Value| {
            Color::from_value(value).map_err(|e| self.error(format!("{}: {}", key, e)))
        };
        match &value {
            Value::Gradient(gradient) => {
                let axis = Axis::from_index(gradient.axis)
                    .ok_or_else(|| self.error(format!("gradient axis must be 0 or 1, not {}", gradient.axis)))?;
                Ok(Paint::Linear {
                    from: color(&gradient.color1)?,
                    to: color(&gradient.color2)?,
                    axis,
                })
            }
            other => Ok(Paint::Single(color(other)?)),
        }
    }

    /// Warn about keyword arguments nothing read, unless `no_check=True`
    pub fn finish(self) {
        if matches!(self.object.kwargs.get("no_check"), Some(Value::Bool(true))) {
            return;
        }
        for key in self.object.kwargs.keys() {
            if !self.used.iter().any(|k| k == key) {
                warn!(object = %self.object.kind, key, "keyword argument was not used");
            }
        }
    }
}
