//! Tree interpreter: evaluates a generic syntax tree into a template value
//!
//! The interpreter is the sandbox. Only registry types can be constructed,
//! only their whitelisted members can be reached, and only `+ - *` and unary
//! negation are evaluated. Every constant and computed result passes the
//! resource guards in [`Limits`].

pub mod arguments;
pub mod error;
pub mod registry;

use tracing::{debug, trace};

use crate::color::Color;
use crate::config::{InterpreterConfig, Limits};
use crate::object::Kwargs;
use crate::parser::expr::{BinaryOperator, UnaryOperator};
use crate::parser::tree::{NodeId, NodeKind, NodeValue, Tree};
use crate::value::{BoundMethod, Value};
use crate::variables::{Key, OperationKind, VariableKind};

pub use arguments::{Arguments, Signature};
pub use error::{InterpretError, LimitExceeded};
pub use registry::{Constructible, Registry};

/// Interpret a tree with default limits
pub fn interpret(tree: &Tree) -> Result<Value, InterpretError> {
    interpret_with_config(tree, &InterpreterConfig::default())
}

/// Interpret a tree with custom configuration
pub fn interpret_with_config(tree: &Tree, config: &InterpreterConfig) -> Result<Value, InterpretError> {
    let interpreter = Interpreter {
        tree,
        limits: config.limits,
        registry: Registry::global(),
    };
    let value = interpreter.visit(tree.root())?;
    debug!(result = %value.type_name(), "interpreted template tree");
    Ok(value)
}

struct Interpreter<'t> {
    tree: &'t Tree,
    limits: Limits,
    registry: &'static Registry,
}

const FACTOR: Signature = Signature::new("lightened", &["factor"], 1);
const DARKEN: Signature = Signature::new("darkened", &["factor"], 1);
const ALPHA: Signature = Signature::new("alpha", &["alpha"], 1);
const FORMATTED: Signature = Signature::new("formatted", &["s"], 1);
const EACH: Signature = Signature::new("IteratorVariable", &["key"], 0);

fn method_signature(name: &str) -> Option<Signature> {
    match name {
        "lightened" => Some(FACTOR),
        "darkened" => Some(DARKEN),
        "alpha" => Some(ALPHA),
        "formatted" => Some(FORMATTED),
        _ => None,
    }
}

impl<'t> Interpreter<'t> {
    fn visit(&self, id: NodeId) -> Result<Value, InterpretError> {
        let node = self.tree.get(id);
        trace!(kind = %node.kind, "visit");
        match node.kind {
            NodeKind::Call => self.visit_call(id),
            NodeKind::Attribute => self.visit_attribute(id),
            NodeKind::List => Ok(Value::List(self.visit_all(&node.children)?)),
            NodeKind::Tuple => Ok(Value::Tuple(self.visit_all(&node.children)?)),
            NodeKind::UnaryOp => self.visit_unary(id),
            NodeKind::BinOp => self.visit_binary(id),
            NodeKind::Constant => self.visit_constant(id),
            NodeKind::Keyword => Err(InterpretError::Malformed(
                "keyword argument outside of a call".to_string(),
            )),
        }
    }

    fn visit_all(&self, ids: &[NodeId]) -> Result<Vec<Value>, InterpretError> {
        ids.iter().map(|id| self.visit(*id)).collect()
    }

    /// The single child of a node that must have exactly one
    fn only_child(&self, id: NodeId, what: &str) -> Result<NodeId, InterpretError> {
        match self.tree.get(id).children.as_slice() {
            [child] => Ok(*child),
            _ => Err(InterpretError::Malformed(format!(
                "{} does not have exactly one child",
                what
            ))),
        }
    }

    fn visit_call(&self, id: NodeId) -> Result<Value, InterpretError> {
        let node = self.tree.get(id);
        let (callee, argument_ids) = match &node.value {
            NodeValue::Ident(name) => {
                let entry = self
                    .registry
                    .get(name)
                    .ok_or_else(|| InterpretError::UnknownType(name.clone()))?;
                (Callee::Constructor(entry), node.children.as_slice())
            }
            NodeValue::Empty => {
                let (&target, rest) = node.children.split_first().ok_or_else(|| {
                    InterpretError::Malformed("call without a target".to_string())
                })?;
                let target_kind = self.tree.get(target).kind;
                if !matches!(target_kind, NodeKind::Attribute | NodeKind::Call) {
                    return Err(InterpretError::Malformed(format!(
                        "call target must be an attribute or a call, not {}",
                        target_kind
                    )));
                }
                (Callee::Value(self.visit(target)?), rest)
            }
            other => {
                return Err(InterpretError::Malformed(format!(
                    "call with value '{}'",
                    other
                )))
            }
        };

        let args = self.visit_arguments(argument_ids)?;
        match callee {
            Callee::Constructor(entry) => entry.construct(args),
            Callee::Value(value) => self.call_value(value, args),
        }
    }

    fn visit_arguments(&self, ids: &[NodeId]) -> Result<Arguments, InterpretError> {
        let mut positional = Vec::new();
        let mut keywords = Kwargs::new();
        for &child in ids {
            let node = self.tree.get(child);
            match (node.kind, &node.value) {
                (NodeKind::Keyword, NodeValue::Ident(name)) => {
                    let value = self.visit(self.only_child(child, "keyword")?)?;
                    if keywords.contains(name) {
                        return Err(InterpretError::Malformed(format!(
                            "keyword argument repeated: {}",
                            name
                        )));
                    }
                    keywords.insert(name.clone(), value);
                }
                (NodeKind::Keyword, _) => {
                    return Err(InterpretError::Malformed("keyword without a name".to_string()))
                }
                _ => positional.push(self.visit(child)?),
            }
        }
        Ok(Arguments::new(positional, keywords))
    }

    /// Call a value obtained from an attribute or an earlier call
    fn call_value(&self, value: Value, args: Arguments) -> Result<Value, InterpretError> {
        match value {
            Value::Method(method) => self.call_method(*method, args),
            Value::Variable(variable) if matches!(variable.kind, VariableKind::Iterator(_)) => {
                let mut bound = args.bind(&EACH)?;
                let key = Key::try_from(bound.take(0).unwrap_or_default())
                    .map_err(|e| InterpretError::invalid_arguments(EACH.callee, e.to_string()))?;
                let type_name = variable.type_name().to_string();
                (*variable)
                    .each(key)
                    .map(Value::from)
                    .ok_or(InterpretError::NotCallable(type_name))
            }
            other => Err(InterpretError::NotCallable(other.type_name())),
        }
    }

    fn call_method(&self, method: BoundMethod, args: Arguments) -> Result<Value, InterpretError> {
        let BoundMethod { receiver, name } = method;
        let signature = method_signature(&name).ok_or_else(|| InterpretError::UnknownMember {
            type_name: receiver.type_name(),
            member: name.clone(),
        })?;
        let mut bound = args.bind(&signature)?;
        let arg = bound.required(0)?;

        match receiver {
            Value::Color(color) => {
                let number = arg.as_f64().ok_or_else(|| {
                    InterpretError::invalid_arguments(signature.callee, "expected a number")
                })?;
                let result: Color = match name.as_str() {
                    "lightened" => color.lightened(number),
                    "darkened" => color.darkened(number),
                    "alpha" => color.alpha(number),
                    _ => {
                        return Err(InterpretError::UnknownMember {
                            type_name: "SingleColor".to_string(),
                            member: name,
                        })
                    }
                };
                Ok(result.into())
            }
            Value::Variable(variable) if name == "formatted" => match arg {
                Value::Str(template) => Ok((*variable).formatted(template).into()),
                other => Err(InterpretError::invalid_arguments(
                    signature.callee,
                    format!("expected a string, not '{}'", other.type_name()),
                )),
            },
            Value::Variable(mut variable) => {
                let kind = match name.as_str() {
                    "lightened" => OperationKind::Lightened,
                    "darkened" => OperationKind::Darkened,
                    _ => OperationKind::Alpha,
                };
                variable.push_operation(kind, arg);
                Ok(Value::Variable(variable))
            }
            other => Err(InterpretError::NotCallable(other.type_name())),
        }
    }

    fn visit_attribute(&self, id: NodeId) -> Result<Value, InterpretError> {
        let member = self
            .tree
            .get(id)
            .value
            .ident()
            .ok_or_else(|| InterpretError::Malformed("attribute without a name".to_string()))?
            .to_string();
        let base = self.visit(self.only_child(id, "attribute")?)?;

        let forbidden = |base: &Value| InterpretError::ForbiddenAccess {
            type_name: base.type_name(),
            member: member.clone(),
        };
        if !self.registry.admits(&base) || member.starts_with('_') {
            return Err(forbidden(&base));
        }

        let method = |receiver: Value| -> Result<Value, InterpretError> {
            Ok(Value::Method(Box::new(BoundMethod {
                receiver,
                name: member.clone(),
            })))
        };
        let unknown = |base: &Value| InterpretError::UnknownMember {
            type_name: base.type_name(),
            member: member.clone(),
        };

        match (&base, member.as_str()) {
            (Value::Color(_), "lightened" | "darkened" | "alpha") => method(base.clone()),
            (Value::Gradient(gradient), "color1") => Ok(gradient.color1.clone()),
            (Value::Gradient(gradient), "color2") => Ok(gradient.color2.clone()),
            (Value::Gradient(gradient), "axis") => Ok(Value::Int(gradient.axis)),
            (Value::Variable(_), "formatted") => method(base.clone()),
            (Value::Variable(variable), "lightened" | "darkened" | "alpha")
                if matches!(variable.kind, VariableKind::Color) =>
            {
                method(base.clone())
            }
            (Value::Object(object), name) => {
                object.attribute(name).cloned().ok_or_else(|| unknown(&base))
            }
            _ => Err(unknown(&base)),
        }
    }

    fn visit_unary(&self, id: NodeId) -> Result<Value, InterpretError> {
        let node = self.tree.get(id);
        let operand = self.only_child(id, "unary operator")?;
        match node.value {
            NodeValue::Unary(UnaryOperator::Neg) => Ok(self.visit(operand)?.neg()?),
            ref other => Err(InterpretError::UnsupportedOperator(other.to_string())),
        }
    }

    fn visit_binary(&self, id: NodeId) -> Result<Value, InterpretError> {
        let node = self.tree.get(id);
        let op = match node.value {
            NodeValue::Binary(
                op @ (BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul),
            ) => op,
            ref other => return Err(InterpretError::UnsupportedOperator(other.to_string())),
        };
        let [left, right] = node.children.as_slice() else {
            return Err(InterpretError::Malformed(
                "binary operator does not have exactly two children".to_string(),
            ));
        };
        let left = self.visit(*left)?;
        let right = self.visit(*right)?;

        // A variable on the left records the operation for resolution time
        if let Value::Variable(mut variable) = left {
            let kind = match op {
                BinaryOperator::Add => OperationKind::Add,
                BinaryOperator::Sub => OperationKind::Sub,
                _ => OperationKind::Mul,
            };
            variable.push_operation(kind, right);
            return Ok(Value::Variable(variable));
        }

        let result = match op {
            BinaryOperator::Add => left.add(&right)?,
            BinaryOperator::Sub => left.sub(&right)?,
            _ => {
                if let Some(len) = left.repeated_len(&right) {
                    self.check_length(len, left.as_str().is_some() || right.as_str().is_some())?;
                }
                left.mul_within(&right, &self.limits)?
            }
        };
        self.check(&result)?;
        Ok(result)
    }

    fn visit_constant(&self, id: NodeId) -> Result<Value, InterpretError> {
        let node = self.tree.get(id);
        if !node.children.is_empty() {
            return Err(InterpretError::Malformed("constant has a child".to_string()));
        }
        let NodeValue::Literal(literal) = &node.value else {
            return Err(InterpretError::Malformed("constant without a literal".to_string()));
        };
        let value = Value::from(literal.clone());
        self.check(&value)?;
        Ok(value)
    }

    fn check_length(&self, len: usize, is_string: bool) -> Result<(), LimitExceeded> {
        if is_string && len > self.limits.max_string_len {
            return Err(LimitExceeded::StringLength {
                len,
                max: self.limits.max_string_len,
            });
        }
        if !is_string && len > self.limits.max_sequence_len {
            return Err(LimitExceeded::SequenceLength {
                len,
                max: self.limits.max_sequence_len,
            });
        }
        Ok(())
    }

    /// Resource guard on a literal or computed value
    fn check(&self, value: &Value) -> Result<(), LimitExceeded> {
        match value {
            Value::Str(s) => self.check_length(s.chars().count(), true),
            Value::List(items) | Value::Tuple(items) => self.check_length(items.len(), false),
            Value::Int(_) | Value::Float(_) => {
                let number = value.as_f64().unwrap_or_default();
                if number > self.limits.max_number {
                    return Err(LimitExceeded::Number {
                        value: number,
                        max: self.limits.max_number,
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

enum Callee {
    Constructor(Constructible),
    Value(Value),
}

impl From<crate::parser::expr::Literal> for Value {
    fn from(literal: crate::parser::expr::Literal) -> Self {
        use crate::parser::expr::Literal;
        match literal {
            Literal::None => Value::None,
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(n) => Value::Int(n),
            Literal::Float(x) => Value::Float(x),
            Literal::Str(s) => Value::Str(s),
        }
    }
}
