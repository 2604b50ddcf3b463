//! Colors: the canonical four-channel color, template-time gradients and the
//! resolved paint handed to renderers

use serde::Serialize;

use crate::value::{format_number, OperandError, Value};

/// Canonical color: three color channels plus opacity, each clamped to 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

fn clamp_channel(value: f64) -> f64 {
    value.clamp(0.0, 255.0)
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
        alpha: 0.0,
    };

    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: clamp_channel(red),
            green: clamp_channel(green),
            blue: clamp_channel(blue),
            alpha: clamp_channel(alpha),
        }
    }

    /// Coerce a channel list into a color.
    ///
    /// No channels is fully transparent black, one is an opaque grey, two a
    /// grey with opacity, three an opaque color, four or more a color with
    /// opacity (extra channels are ignored).
    pub fn from_channels(channels: &[f64]) -> Self {
        match channels {
            [] => Self::TRANSPARENT,
            [grey] => Self::rgba(*grey, *grey, *grey, 255.0),
            [grey, alpha] => Self::rgba(*grey, *grey, *grey, *alpha),
            [red, green, blue] => Self::rgba(*red, *green, *blue, 255.0),
            [red, green, blue, alpha, ..] => Self::rgba(*red, *green, *blue, *alpha),
        }
    }

    /// Coerce a dynamic value (a color or a numeric sequence) into a color
    pub fn from_value(value: &Value) -> Result<Self, OperandError> {
        match value {
            Value::Color(color) => Ok(*color),
            Value::List(items) | Value::Tuple(items) => {
                let channels = items
                    .iter()
                    .map(|item| {
                        item.as_f64().ok_or_else(|| OperandError::TypeMismatch {
                            op: "color channel",
                            left: "SingleColor".to_string(),
                            right: item.type_name(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::from_channels(&channels))
            }
            other => Err(OperandError::TypeMismatch {
                op: "SingleColor",
                left: "SingleColor".to_string(),
                right: other.type_name(),
            }),
        }
    }

    /// Scale the color channels, keeping opacity
    pub fn lightened(&self, factor: f64) -> Self {
        Self::rgba(
            self.red * factor,
            self.green * factor,
            self.blue * factor,
            self.alpha,
        )
    }

    pub fn darkened(&self, factor: f64) -> Self {
        self.lightened(1.0 - factor)
    }

    /// Same color with a new opacity
    pub fn alpha(&self, alpha: f64) -> Self {
        Self::rgba(self.red, self.green, self.blue, alpha)
    }

    pub fn channels(&self) -> [f64; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.alpha == 0.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, a] = self.channels();
        write!(
            f,
            "SingleColor(({}, {}, {}, {}))",
            format_number(r),
            format_number(g),
            format_number(b),
            format_number(a)
        )
    }
}

/// Two-color linear gradient as it appears in a template.
///
/// The end colors stay dynamic so they can hold variables until resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub color1: Value,
    pub color2: Value,
    pub axis: i64,
}

impl Gradient {
    /// Build a gradient, turning literal channel sequences into colors
    pub fn new(color1: Value, color2: Value, axis: i64) -> Result<Self, OperandError> {
        Ok(Self {
            color1: validated(color1)?,
            color2: validated(color2)?,
            axis,
        })
    }
}

fn validated(value: Value) -> Result<Value, OperandError> {
    match value {
        Value::List(_) | Value::Tuple(_) => Ok(Value::Color(Color::from_value(&value)?)),
        other => Ok(other),
    }
}

/// Gradient direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Axis 0: top to bottom
    Vertical,
    /// Axis 1: left to right
    Horizontal,
}

impl Axis {
    pub fn from_index(axis: i64) -> Option<Self> {
        match axis {
            0 => Some(Axis::Vertical),
            1 => Some(Axis::Horizontal),
            _ => None,
        }
    }
}

/// Fully resolved fill of a colored layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Paint {
    Single(Color),
    Linear { from: Color, to: Color, axis: Axis },
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Single(Color::TRANSPARENT)
    }
}

impl Paint {
    pub fn is_fully_transparent(&self) -> bool {
        match self {
            Paint::Single(color) => color.is_fully_transparent(),
            Paint::Linear { from, to, .. } => {
                from.is_fully_transparent() && to.is_fully_transparent()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_coercion() {
        assert_eq!(Color::from_channels(&[]), Color::TRANSPARENT);
        assert_eq!(
            Color::from_channels(&[10.0]),
            Color::rgba(10.0, 10.0, 10.0, 255.0)
        );
        assert_eq!(
            Color::from_channels(&[10.0, 20.0]),
            Color::rgba(10.0, 10.0, 10.0, 20.0)
        );
        assert_eq!(
            Color::from_channels(&[1.0, 2.0, 3.0]),
            Color::rgba(1.0, 2.0, 3.0, 255.0)
        );
        assert_eq!(
            Color::from_channels(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            Color::rgba(1.0, 2.0, 3.0, 4.0)
        );
    }

    #[test]
    fn test_channels_clamped() {
        let color = Color::from_channels(&[-5.0, 300.0, 128.0]);
        assert_eq!(color.channels(), [0.0, 255.0, 128.0, 255.0]);
    }

    #[test]
    fn test_lightened_darkened_alpha() {
        let color = Color::rgba(100.0, 200.0, 50.0, 128.0);
        assert_eq!(color.lightened(2.0), Color::rgba(200.0, 255.0, 100.0, 128.0));
        assert_eq!(color.darkened(0.5), Color::rgba(50.0, 100.0, 25.0, 128.0));
        assert_eq!(color.alpha(7.0).alpha, 7.0);
    }

    #[test]
    fn test_from_value_rejects_strings() {
        assert!(Color::from_value(&Value::from("red")).is_err());
        assert!(Color::from_value(&Value::from(vec![Value::from("r")])).is_err());
    }

    #[test]
    fn test_gradient_validates_sequences() {
        let gradient = Gradient::new(
            Value::from((255, 0, 0)),
            Value::Color(Color::TRANSPARENT),
            1,
        )
        .expect("valid gradient");
        assert_eq!(
            gradient.color1,
            Value::Color(Color::rgba(255.0, 0.0, 0.0, 255.0))
        );
    }

    #[test]
    fn test_display_uses_constructor_syntax() {
        assert_eq!(
            Color::rgba(1.0, 2.5, 3.0, 255.0).to_string(),
            "SingleColor((1, 2.5, 3, 255))"
        );
    }
}
