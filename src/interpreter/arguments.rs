//! Binding call arguments to constructor and method signatures

use crate::interpreter::error::InterpretError;
use crate::object::Kwargs;
use crate::value::Value;

/// Evaluated arguments of one call
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keywords: Kwargs,
}

/// Parameter list of a callable: names in positional order, the first
/// `required` of which must be supplied
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub callee: &'static str,
    pub params: &'static [&'static str],
    pub required: usize,
}

impl Signature {
    pub const fn new(callee: &'static str, params: &'static [&'static str], required: usize) -> Self {
        Self {
            callee,
            params,
            required,
        }
    }
}

/// Arguments matched to parameter slots
#[derive(Debug)]
pub struct Bound {
    callee: &'static str,
    slots: Vec<Option<Value>>,
}

impl Bound {
    /// Take a parameter value, if it was given
    pub fn take(&mut self, index: usize) -> Option<Value> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Take a parameter that the signature marks as required
    pub fn required(&mut self, index: usize) -> Result<Value, InterpretError> {
        self.take(index).ok_or_else(|| {
            InterpretError::invalid_arguments(self.callee, format!("missing argument #{}", index + 1))
        })
    }
}

impl Arguments {
    pub fn new(positional: Vec<Value>, keywords: Kwargs) -> Self {
        Self {
            positional,
            keywords,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Match the arguments against `signature` the way the host language does
    pub fn bind(self, signature: &Signature) -> Result<Bound, InterpretError> {
        let fail = |message: String| InterpretError::invalid_arguments(signature.callee, message);

        if self.positional.len() > signature.params.len() {
            return Err(fail(format!(
                "takes {} positional arguments but {} were given",
                signature.params.len(),
                self.positional.len()
            )));
        }

        let mut slots: Vec<Option<Value>> = vec![None; signature.params.len()];
        for (slot, value) in slots.iter_mut().zip(self.positional) {
            *slot = Some(value);
        }

        for (name, value) in self.keywords.iter() {
            let index = signature
                .params
                .iter()
                .position(|p| *p == name)
                .ok_or_else(|| fail(format!("got an unexpected keyword argument '{}'", name)))?;
            if slots[index].is_some() {
                return Err(fail(format!("got multiple values for argument '{}'", name)));
            }
            slots[index] = Some(value.clone());
        }

        if let Some(missing) = signature.params[..signature.required]
            .iter()
            .zip(&slots)
            .find(|(_, slot)| slot.is_none())
            .map(|(name, _)| name)
        {
            return Err(fail(format!("missing required argument: '{}'", missing)));
        }

        Ok(Bound {
            callee: signature.callee,
            slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADIENT: Signature = Signature::new("LinearGradientColor", &["color1", "color2", "axis"], 2);

    fn args(positional: Vec<Value>, keywords: &[(&str, Value)]) -> Arguments {
        Arguments::new(positional, keywords.iter().cloned().collect())
    }

    #[test]
    fn test_positional_and_keyword_mix() {
        let mut bound = args(vec![Value::Int(1)], &[("axis", Value::Int(1)), ("color2", Value::Int(2))])
            .bind(&GRADIENT)
            .expect("should bind");
        assert_eq!(bound.take(0), Some(Value::Int(1)));
        assert_eq!(bound.take(1), Some(Value::Int(2)));
        assert_eq!(bound.take(2), Some(Value::Int(1)));
        assert_eq!(bound.take(2), None);
    }

    #[test]
    fn test_optional_left_empty() {
        let mut bound = args(vec![Value::Int(1), Value::Int(2)], &[])
            .bind(&GRADIENT)
            .expect("should bind");
        assert_eq!(bound.take(2), None);
        assert!(bound.required(2).is_err());
    }

    #[test]
    fn test_errors() {
        let too_many = args(vec![Value::None; 4], &[]).bind(&GRADIENT).unwrap_err();
        assert_eq!(
            too_many.to_string(),
            "LinearGradientColor(): takes 3 positional arguments but 4 were given"
        );

        let unknown = args(vec![], &[("colour", Value::None)]).bind(&GRADIENT).unwrap_err();
        assert!(unknown.to_string().contains("unexpected keyword argument 'colour'"));

        let twice = args(vec![Value::None], &[("color1", Value::None)])
            .bind(&GRADIENT)
            .unwrap_err();
        assert!(twice.to_string().contains("multiple values for argument 'color1'"));

        let missing = args(vec![Value::None], &[]).bind(&GRADIENT).unwrap_err();
        assert!(missing.to_string().contains("missing required argument: 'color2'"));
    }
}
