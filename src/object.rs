//! Keyword-argument holders: stacks and layers before initialization
//!
//! An [`Object`] only records the keyword arguments it was constructed with.
//! Reading them into typed fields happens in [`crate::layers`], after every
//! variable inside has been bound.

use std::fmt;

use crate::value::Value;

/// The constructible stack and layer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    ImageStack,
    AnimatedImageStack,
    EmptyLayer,
    ColorLayer,
    RectangleLayer,
    LineLayer,
    TextLayer,
    WebImageLayer,
    EmojiLayer,
    ProgressLayer,
    PieLayer,
    ListLayer,
    RotationLayer,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 13] = [
        ObjectKind::ImageStack,
        ObjectKind::AnimatedImageStack,
        ObjectKind::EmptyLayer,
        ObjectKind::ColorLayer,
        ObjectKind::RectangleLayer,
        ObjectKind::LineLayer,
        ObjectKind::TextLayer,
        ObjectKind::WebImageLayer,
        ObjectKind::EmojiLayer,
        ObjectKind::ProgressLayer,
        ObjectKind::PieLayer,
        ObjectKind::ListLayer,
        ObjectKind::RotationLayer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::ImageStack => "ImageStack",
            ObjectKind::AnimatedImageStack => "AnimatedImageStack",
            ObjectKind::EmptyLayer => "EmptyLayer",
            ObjectKind::ColorLayer => "ColorLayer",
            ObjectKind::RectangleLayer => "RectangleLayer",
            ObjectKind::LineLayer => "LineLayer",
            ObjectKind::TextLayer => "TextLayer",
            ObjectKind::WebImageLayer => "WebImageLayer",
            ObjectKind::EmojiLayer => "EmojiLayer",
            ObjectKind::ProgressLayer => "ProgressLayer",
            ObjectKind::PieLayer => "PieLayer",
            ObjectKind::ListLayer => "ListLayer",
            ObjectKind::RotationLayer => "RotationLayer",
        }
    }

    /// Only stacks take their layers positionally
    pub fn accepts_positional(self) -> bool {
        matches!(self, ObjectKind::ImageStack)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Keyword arguments in the order they were given
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Kwargs(Vec<(String, Value)>);

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a keyword, replacing an earlier value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.0.iter_mut().map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Kwargs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut kwargs = Kwargs::new();
        for (k, v) in iter {
            kwargs.insert(k, v);
        }
        kwargs
    }
}

/// A stack or layer holding its raw keyword arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub kind: ObjectKind,
    pub kwargs: Kwargs,
}

impl Object {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            kwargs: Kwargs::new(),
        }
    }

    /// Builder-style keyword setter for constructing templates in code
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key, value);
        self
    }

    /// Stack from positional layers
    pub fn stack(layers: impl IntoIterator<Item = Object>) -> Self {
        let layers = layers.into_iter().map(Value::from).collect::<Vec<_>>();
        Self::new(ObjectKind::ImageStack).with("layers", Value::List(layers))
    }

    /// Read a stored keyword argument through attribute access
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kwargs_keep_order_and_replace() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("pos", (0, 0));
        kwargs.insert("color", (255, 0, 0));
        kwargs.insert("pos", (5, 5));
        assert_eq!(kwargs.keys().collect::<Vec<_>>(), vec!["pos", "color"]);
        assert_eq!(kwargs.get("pos"), Some(&Value::from((5, 5))));
        assert_eq!(kwargs.len(), 2);
    }

    #[test]
    fn test_builder() {
        let layer = Object::new(ObjectKind::TextLayer).with("text", "hi");
        assert_eq!(layer.attribute("text"), Some(&Value::from("hi")));
        assert_eq!(layer.attribute("font"), None);

        let stack = Object::stack([layer.clone()]);
        assert_eq!(
            stack.attribute("layers"),
            Some(&Value::List(vec![Value::from(layer)]))
        );
    }

    #[test]
    fn test_only_stacks_take_positionals() {
        assert!(ObjectKind::ImageStack.accepts_positional());
        assert!(!ObjectKind::TextLayer.accepts_positional());
        assert_eq!(ObjectKind::ALL.len(), 13);
    }
}
