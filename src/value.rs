//! Dynamic values flowing through interpretation and resolution
//!
//! Arithmetic follows the host-language rules the expression grammar is
//! modelled on: bools count as integers, true division always yields a
//! float, floor division rounds toward negative infinity, and sequences
//! concatenate and repeat.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::color::{Color, Gradient};
use crate::config::Limits;
use crate::object::Object;
use crate::variables::Variable;

/// Errors raised by value-level operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperandError {
    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    TypeMismatch {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("bad operand type for {op}: '{operand}'")]
    BadOperand { op: &'static str, operand: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    #[error("repetition would produce {len} items, more than the {max} allowed")]
    TooLong { len: usize, max: usize },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("'{0}' object is not subscriptable")]
    NotSubscriptable(String),

    #[error("object of type '{0}' has no len()")]
    NoLength(String),

    #[error("'{op}' not supported between instances of '{left}' and '{right}'")]
    NotComparable {
        op: &'static str,
        left: String,
        right: String,
    },
}

/// A method looked up on a value but not yet invoked
#[derive(Debug, Clone, PartialEq)]
pub struct BoundMethod {
    pub receiver: Value,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Color(Color),
    Gradient(Box<Gradient>),
    Object(Box<Object>),
    Variable(Box<Variable>),
    Method(Box<BoundMethod>),
}

/// Numeric view used by arithmetic
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Value {
    /// Host-language type name, used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Map(_) => "dict".to_string(),
            Value::Color(_) => "SingleColor".to_string(),
            Value::Gradient(_) => "LinearGradientColor".to_string(),
            Value::Object(object) => object.kind.name().to_string(),
            Value::Variable(variable) => variable.type_name().to_string(),
            Value::Method(_) => "method".to_string(),
        }
    }

    fn as_num(&self) -> Option<Num> {
        match self {
            Value::Bool(b) => Some(Num::Int(*b as i64)),
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Float(x) => Some(Num::Float(*x)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.as_num()? {
            Num::Int(n) => Some(n as f64),
            Num::Float(x) => Some(x),
        }
    }

    /// Integer view; floats are not silently truncated
    pub fn as_i64(&self) -> Option<i64> {
        match self.as_num()? {
            Num::Int(n) => Some(n),
            Num::Float(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or tuple
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Host-language truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            _ => true,
        }
    }

    /// Length of a sized value (strings count characters)
    pub fn len(&self) -> Result<usize, OperandError> {
        match self {
            Value::Str(s) => Ok(s.chars().count()),
            Value::List(items) | Value::Tuple(items) => Ok(items.len()),
            Value::Map(map) => Ok(map.len()),
            other => Err(OperandError::NoLength(other.type_name())),
        }
    }

    fn mismatch(op: &'static str, left: &Value, right: &Value) -> OperandError {
        OperandError::TypeMismatch {
            op,
            left: left.type_name(),
            right: right.type_name(),
        }
    }

    fn numeric(
        &self,
        other: &Value,
        op: &'static str,
        int: fn(i64, i64) -> Option<i64>,
        float: fn(f64, f64) -> f64,
    ) -> Result<Value, OperandError> {
        match (self.as_num(), other.as_num()) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => {
                int(a, b).map(Value::Int).ok_or(OperandError::Overflow(op))
            }
            (Some(a), Some(b)) => Ok(Value::Float(float(num_f64(a), num_f64(b)))),
            _ => Err(Self::mismatch(op, self, other)),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, OperandError> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            (Value::List(a), Value::List(b)) => Ok(Value::List(concat(a, b))),
            (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple(concat(a, b))),
            _ => self.numeric(other, "+", i64::checked_add, |a, b| a + b),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, OperandError> {
        self.numeric(other, "-", i64::checked_sub, |a, b| a - b)
    }

    /// `*` with repetition bounded by the default [`Limits`]
    pub fn mul(&self, other: &Value) -> Result<Value, OperandError> {
        self.mul_within(other, &Limits::default())
    }

    /// `*`, refusing repetitions longer than `limits` allow
    pub fn mul_within(&self, other: &Value, limits: &Limits) -> Result<Value, OperandError> {
        if let Some((seq, count)) = self.repetition(other) {
            let count = usize::try_from(count).unwrap_or(0);
            let bounded = |len: usize, max: usize| match len.checked_mul(count) {
                Some(total) if total <= max => Ok(()),
                total => Err(OperandError::TooLong {
                    len: total.unwrap_or(usize::MAX),
                    max,
                }),
            };
            match seq {
                Value::Str(s) => {
                    bounded(s.chars().count(), limits.max_string_len)?;
                    return Ok(Value::Str(s.repeat(count)));
                }
                Value::List(items) => {
                    bounded(items.len(), limits.max_sequence_len)?;
                    return Ok(Value::List(repeat(items, count)));
                }
                Value::Tuple(items) => {
                    bounded(items.len(), limits.max_sequence_len)?;
                    return Ok(Value::Tuple(repeat(items, count)));
                }
                _ => {}
            }
        }
        self.numeric(other, "*", i64::checked_mul, |a, b| a * b)
    }

    /// The sequence and count of a `seq * n` / `n * seq` product
    fn repetition<'a>(&'a self, other: &'a Value) -> Option<(&'a Value, i64)> {
        let is_seq = |v: &Value| matches!(v, Value::Str(_) | Value::List(_) | Value::Tuple(_));
        match (self.as_i64(), other.as_i64()) {
            (_, Some(n)) if is_seq(self) => Some((self, n)),
            (Some(n), _) if is_seq(other) => Some((other, n)),
            _ => None,
        }
    }

    /// Length a `*` would produce, without producing it
    pub fn repeated_len(&self, other: &Value) -> Option<usize> {
        let (seq, count) = self.repetition(other)?;
        let len = seq.len().ok()?;
        Some(len.saturating_mul(count.max(0) as usize))
    }

    pub fn div(&self, other: &Value) -> Result<Value, OperandError> {
        match (self.as_f64(), other.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => Err(OperandError::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(Self::mismatch("/", self, other)),
        }
    }

    pub fn floor_div(&self, other: &Value) -> Result<Value, OperandError> {
        match (self.as_num(), other.as_num()) {
            (Some(_), Some(Num::Int(0))) => Err(OperandError::DivisionByZero),
            (Some(_), Some(Num::Float(b))) if b == 0.0 => Err(OperandError::DivisionByZero),
            (Some(Num::Int(a)), Some(Num::Int(b))) => {
                let q = a.checked_div(b).ok_or(OperandError::Overflow("//"))?;
                let adjust = a % b != 0 && ((a < 0) != (b < 0));
                Ok(Value::Int(if adjust { q - 1 } else { q }))
            }
            (Some(a), Some(b)) => Ok(Value::Float((num_f64(a) / num_f64(b)).floor())),
            _ => Err(Self::mismatch("//", self, other)),
        }
    }

    pub fn neg(&self) -> Result<Value, OperandError> {
        match self.as_num() {
            Some(Num::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(OperandError::Overflow("unary -")),
            Some(Num::Float(x)) => Ok(Value::Float(-x)),
            None => Err(OperandError::BadOperand {
                op: "unary -",
                operand: self.type_name(),
            }),
        }
    }

    /// Subscript lookup: sequences by (possibly negative) index, maps by key
    pub fn index(&self, key: &Value) -> Result<Value, OperandError> {
        match self {
            Value::List(items) | Value::Tuple(items) => {
                let index = key
                    .as_i64()
                    .ok_or_else(|| Self::mismatch("[]", self, key))?;
                Ok(items[normalize_index(index, items.len())?].clone())
            }
            Value::Str(s) => {
                let index = key
                    .as_i64()
                    .ok_or_else(|| Self::mismatch("[]", self, key))?;
                let chars: Vec<char> = s.chars().collect();
                Ok(Value::Str(chars[normalize_index(index, chars.len())?].to_string()))
            }
            Value::Map(map) => {
                let name = match key {
                    Value::Str(s) => s.clone(),
                    other => other.to_string(),
                };
                map.get(&name)
                    .cloned()
                    .ok_or(OperandError::KeyNotFound(name))
            }
            other => Err(OperandError::NotSubscriptable(other.type_name())),
        }
    }

    /// Host-language `==`: numbers compare across int, float and bool
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => match (self.as_num(), other.as_num()) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
                (Some(a), Some(b)) => num_f64(a) == num_f64(b),
                _ => self == other,
            },
        }
    }

    /// Host-language ordering, failing for unordered type pairs
    pub fn compare(&self, other: &Value) -> Result<Ordering, OperandError> {
        let unordered = || OperandError::NotComparable {
            op: ">",
            left: self.type_name(),
            right: other.type_name(),
        };
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.loose_eq(y) {
                        return x.compare(y);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => match (self.as_num(), other.as_num()) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a.cmp(&b)),
                (Some(a), Some(b)) => num_f64(a).partial_cmp(&num_f64(b)).ok_or_else(unordered),
                _ => Err(unordered()),
            },
        }
    }

    /// Quoted representation, as used for elements inside containers
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote_str(s),
            other => other.to_string(),
        }
    }
}

fn num_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(x) => x,
    }
}

fn concat(a: &[Value], b: &[Value]) -> Vec<Value> {
    a.iter().chain(b).cloned().collect()
}

fn repeat(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    out
}

fn normalize_index(index: i64, len: usize) -> Result<usize, OperandError> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved >= len as i64 {
        return Err(OperandError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// Float text the way the host language prints it (`2.0`, `0.5`, `1e+20`)
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else if x.abs() >= 1e16 || x.abs() < 1e-4 {
        let formatted = format!("{:e}", x);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        }
    } else {
        format!("{}", x)
    }
}

/// Number text that drops a zero fraction (`3` instead of `3.0`)
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.is_finite() && x.abs() < 1e16 {
        format!("{}", x as i64)
    } else {
        format_float(x)
    }
}

/// Quote a string with single quotes unless it only contains single quotes
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Value::Tuple(items) => write!(f, "({})", join_repr(items)),
            Value::Map(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", quote_str(k), v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", entries)
            }
            Value::Color(color) => write!(f, "{}", color),
            Value::Gradient(gradient) => write!(
                f,
                "LinearGradientColor({}, {}, axis={})",
                gradient.color1.repr(),
                gradient.color2.repr(),
                gradient.axis
            ),
            Value::Object(object) => write!(f, "<{} object>", object.kind.name()),
            Value::Variable(variable) => write!(f, "<{}>", variable.type_name()),
            Value::Method(method) => write!(
                f,
                "<bound method {}.{}>",
                method.receiver.type_name(),
                method.name
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Color> for Value {
    fn from(color: Color) -> Self {
        Value::Color(color)
    }
}

impl From<Gradient> for Value {
    fn from(gradient: Gradient) -> Self {
        Value::Gradient(Box::new(gradient))
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(Box::new(object))
    }
}

impl From<Variable> for Value {
    fn from(variable: Variable) -> Self {
        Value::Variable(Box::new(variable))
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>, D: Into<Value>> From<(A, B, C, D)>
    for Value
{
    fn from((a, b, c, d): (A, B, C, D)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into(), d.into()])
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::Str(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(x) => Value::Float(x),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
            toml::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => Value::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_and_float_arithmetic() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(Value::Int(2).add(&Value::Float(0.5)), Ok(Value::Float(2.5)));
        assert_eq!(Value::Bool(true).mul(&Value::Int(7)), Ok(Value::Int(7)));
        assert_eq!(Value::Int(7).div(&Value::Int(2)), Ok(Value::Float(3.5)));
        assert_eq!(Value::Int(4).div(&Value::Int(2)), Ok(Value::Float(2.0)));
    }

    #[test]
    fn test_floor_division_rounds_down() {
        assert_eq!(Value::Int(7).floor_div(&Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(Value::Int(-7).floor_div(&Value::Int(2)), Ok(Value::Int(-4)));
        assert_eq!(Value::Int(7).floor_div(&Value::Int(-2)), Ok(Value::Int(-4)));
        assert_eq!(
            Value::Float(7.5).floor_div(&Value::Int(2)),
            Ok(Value::Float(3.0))
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            Value::Int(1).div(&Value::Int(0)),
            Err(OperandError::DivisionByZero)
        );
        assert_eq!(
            Value::Int(1).floor_div(&Value::Float(0.0)),
            Err(OperandError::DivisionByZero)
        );
    }

    #[test]
    fn test_overflow_is_error() {
        assert_eq!(
            Value::Int(i64::MAX).add(&Value::Int(1)),
            Err(OperandError::Overflow("+"))
        );
    }

    #[test]
    fn test_sequence_concat_and_repeat() {
        assert_eq!(
            Value::from("ab").add(&Value::from("cd")),
            Ok(Value::from("abcd"))
        );
        assert_eq!(Value::from("ab").mul(&Value::Int(3)), Ok(Value::from("ababab")));
        assert_eq!(Value::Int(2).mul(&Value::from("x")), Ok(Value::from("xx")));
        assert_eq!(Value::from("x").mul(&Value::Int(-1)), Ok(Value::from("")));
        assert_eq!(
            Value::List(vec![Value::Int(1)]).mul(&Value::Int(2)),
            Ok(Value::List(vec![Value::Int(1), Value::Int(1)]))
        );
        assert_eq!(Value::from("ab").repeated_len(&Value::Int(300)), Some(600));
        assert_eq!(Value::Int(1).repeated_len(&Value::Int(300)), None);
    }

    #[test]
    fn test_repetition_is_bounded() {
        assert_eq!(
            Value::from("ab").mul(&Value::Int(1 << 62)),
            Err(OperandError::TooLong {
                len: 1 << 63,
                max: 500
            })
        );
        assert_eq!(
            Value::Int(501).mul(&Value::List(vec![Value::None])),
            Err(OperandError::TooLong { len: 501, max: 500 })
        );
        assert!(Value::from("ab").mul(&Value::Int(250)).is_ok());
        assert!(matches!(
            Value::from("abcd").mul(&Value::Int(i64::MAX)),
            Err(OperandError::TooLong { len: usize::MAX, .. })
        ));

        let wide = Limits::default().with_max_string_len(1000);
        assert!(Value::from("ab").mul_within(&Value::Int(500), &wide).is_ok());
    }

    #[test]
    fn test_mismatched_types() {
        let err = Value::from("a").sub(&Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for -: 'str' and 'int'"
        );
        assert!(Value::from("a").add(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_index_lookup() {
        let list = Value::from((1, 2, 3));
        assert_eq!(list.index(&Value::Int(-1)), Ok(Value::Int(3)));
        assert_eq!(
            list.index(&Value::Int(3)),
            Err(OperandError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(Value::from("héllo").index(&Value::Int(1)), Ok(Value::from("é")));

        let map: Value = [("name", "ada")].into_iter().collect();
        assert_eq!(map.index(&Value::from("name")), Ok(Value::from("ada")));
        assert_eq!(
            map.index(&Value::from("age")),
            Err(OperandError::KeyNotFound("age".into()))
        );
        assert!(Value::Int(3).index(&Value::Int(0)).is_err());
    }

    #[test]
    fn test_loose_equality_and_ordering() {
        assert!(Value::Int(5).loose_eq(&Value::Float(5.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Int(1)));
        assert!(!Value::from("5").loose_eq(&Value::Int(5)));
        assert_eq!(Value::Int(7).compare(&Value::Float(5.5)), Ok(Ordering::Greater));
        assert_eq!(Value::from("a").compare(&Value::from("b")), Ok(Ordering::Less));
        assert!(Value::from("a").compare(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_display_matches_host_printing() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Float(1e20).to_string(), "1e+20");
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::from((1, "a")).to_string(), "(1, 'a')");
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(quote_str("it's"), "\"it's\"");
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"name": "ada", "points": [1, 2.5], "ok": true}"#)
                .expect("valid json");
        let value = Value::from(json);
        assert_eq!(value.index(&Value::from("name")), Ok(Value::from("ada")));
        assert_eq!(
            value.index(&Value::from("points")),
            Ok(Value::List(vec![Value::Int(1), Value::Float(2.5)]))
        );
    }
}
