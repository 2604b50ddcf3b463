//! The concrete layer graph a resolution produces
//!
//! Initialization reads each object's now-bound keyword arguments into the
//! typed structs below. Nested objects are initialized in place, so a list
//! layer that initializes its template several times sees iterator
//! variables advance between items.

mod reader;
pub mod text;

use serde::Serialize;
use tracing::trace;

use crate::color::{Color, Paint};
use crate::config::{MAX_REPEATED_LAYERS, MAX_SEQUENCE_LEN};
use crate::object::{Object, ObjectKind};
use crate::template::ResolveError;
use crate::value::Value;
use crate::variables::evaluate;

use reader::KwargReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    X,
    Y,
}

/// Placement shared by every layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Align {
    pub pos: (f64, f64),
    pub align_x: HorizontalAlign,
    pub align_y: VerticalAlign,
    /// Negative components mean unbounded
    pub max_size: (f64, f64),
}

impl Default for Align {
    fn default() -> Self {
        Self {
            pos: (0.0, 0.0),
            align_x: HorizontalAlign::Left,
            align_y: VerticalAlign::Top,
            max_size: (-1.0, -1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackLayer {
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimatedStackLayer {
    pub animated: Box<Layer>,
    pub static_fg: Option<Box<Layer>>,
    pub static_bg: Option<Box<Layer>>,
    pub seconds: f64,
    pub fps: f64,
    #[serde(rename = "loop")]
    pub loop_count: i64,
    pub bg_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillLayer {
    #[serde(flatten)]
    pub align: Align,
    pub color: Paint,
    pub resize: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectangleLayer {
    #[serde(flatten)]
    pub align: Align,
    pub color: Paint,
    pub size: (f64, f64),
    pub radius: f64,
    /// Negative fills the shape
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressLayer {
    #[serde(flatten)]
    pub rectangle: RectangleLayer,
    pub direction: Direction,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineLayer {
    #[serde(flatten)]
    pub align: Align,
    pub color: Paint,
    pub target: (f64, f64),
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayer {
    #[serde(flatten)]
    pub align: Align,
    pub color: Paint,
    pub font: String,
    pub font_size: f64,
    pub line_margin: f64,
    pub text_align: HorizontalAlign,
    pub text_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebImageLayer {
    #[serde(flatten)]
    pub align: Align,
    pub url: String,
    pub resize: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmojiLayer {
    #[serde(flatten)]
    pub align: Align,
    pub emoji: String,
    pub resize: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieLayer {
    #[serde(flatten)]
    pub align: Align,
    pub color: Paint,
    pub radius: f64,
    pub border_width: f64,
    pub line_width: f64,
    pub choices: Vec<Layer>,
    pub choices_radius: f64,
    pub rotate_choices: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListLayer {
    #[serde(flatten)]
    pub align: Align,
    pub repeat: usize,
    /// The template initialized `repeat` times
    pub items: Vec<Layer>,
    pub direction: Direction,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationLayer {
    pub rotate: Box<Layer>,
    /// Degrees per unit of animation progress
    pub rotation: f64,
    pub bg_color: Color,
}

impl RotationLayer {
    /// Rotation angle at animation progress `t`, normalized to 0..360
    pub fn angle_at(&self, t: f64) -> f64 {
        (self.rotation * t).rem_euclid(360.0)
    }
}

/// A fully resolved stack or layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Layer {
    ImageStack(StackLayer),
    AnimatedImageStack(AnimatedStackLayer),
    EmptyLayer(FillLayer),
    ColorLayer(FillLayer),
    RectangleLayer(RectangleLayer),
    ProgressLayer(ProgressLayer),
    LineLayer(LineLayer),
    TextLayer(TextLayer),
    WebImageLayer(WebImageLayer),
    EmojiLayer(EmojiLayer),
    PieLayer(PieLayer),
    ListLayer(ListLayer),
    RotationLayer(RotationLayer),
}

impl Layer {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Layer::ImageStack(_) => ObjectKind::ImageStack,
            Layer::AnimatedImageStack(_) => ObjectKind::AnimatedImageStack,
            Layer::EmptyLayer(_) => ObjectKind::EmptyLayer,
            Layer::ColorLayer(_) => ObjectKind::ColorLayer,
            Layer::RectangleLayer(_) => ObjectKind::RectangleLayer,
            Layer::ProgressLayer(_) => ObjectKind::ProgressLayer,
            Layer::LineLayer(_) => ObjectKind::LineLayer,
            Layer::TextLayer(_) => ObjectKind::TextLayer,
            Layer::WebImageLayer(_) => ObjectKind::WebImageLayer,
            Layer::EmojiLayer(_) => ObjectKind::EmojiLayer,
            Layer::PieLayer(_) => ObjectKind::PieLayer,
            Layer::ListLayer(_) => ObjectKind::ListLayer,
            Layer::RotationLayer(_) => ObjectKind::RotationLayer,
        }
    }

    /// Directly nested layers, in drawing order
    pub fn children(&self) -> Vec<&Layer> {
        match self {
            Layer::ImageStack(stack) => stack.layers.iter().collect(),
            Layer::AnimatedImageStack(animated) => animated
                .static_bg
                .iter()
                .map(|l| &**l)
                .chain(std::iter::once(&*animated.animated))
                .chain(animated.static_fg.iter().map(|l| &**l))
                .collect(),
            Layer::PieLayer(pie) => pie.choices.iter().collect(),
            Layer::ListLayer(list) => list.items.iter().collect(),
            Layer::RotationLayer(rotation) => vec![&*rotation.rotate],
            _ => Vec::new(),
        }
    }

    /// Every text line in the graph, depth first
    pub fn text_lines(&self) -> Vec<&str> {
        let mut lines = Vec::new();
        self.collect_text(&mut lines);
        lines
    }

    fn collect_text<'a>(&'a self, lines: &mut Vec<&'a str>) {
        if let Layer::TextLayer(text) = self {
            lines.extend(text.text_lines.iter().map(String::as_str));
        }
        for child in self.children() {
            child.collect_text(lines);
        }
    }
}

/// Initialize an object whose variables are all bound
pub fn initialize(object: &mut Object) -> Result<Layer, ResolveError> {
    initialize_copies(object, 1)
}

fn initialize_copies(object: &mut Object, copies: usize) -> Result<Layer, ResolveError> {
    trace!(object = %object.kind, copies, "initializing");
    let kind = object.kind;
    let mut reader = KwargReader::new(object).with_copies(copies);
    let layer = match kind {
        ObjectKind::ImageStack => Layer::ImageStack(read_stack(&mut reader)?),
        ObjectKind::AnimatedImageStack => Layer::AnimatedImageStack(read_animated(&mut reader)?),
        ObjectKind::EmptyLayer => Layer::EmptyLayer(read_fill(&mut reader)?),
        ObjectKind::ColorLayer => Layer::ColorLayer(read_fill(&mut reader)?),
        ObjectKind::RectangleLayer => Layer::RectangleLayer(read_rectangle(&mut reader)?),
        ObjectKind::ProgressLayer => Layer::ProgressLayer(read_progress(&mut reader)?),
        ObjectKind::LineLayer => Layer::LineLayer(LineLayer {
            align: read_align(&mut reader)?,
            color: reader.paint("color")?,
            target: {
                let target = reader.required("target")?;
                reader.to_pair("target", &target)?
            },
            line_width: reader.number("line_width", -1.0)?,
        }),
        ObjectKind::TextLayer => Layer::TextLayer(read_text(&mut reader)?),
        ObjectKind::WebImageLayer => Layer::WebImageLayer(WebImageLayer {
            align: read_align(&mut reader)?,
            url: {
                let url = reader.required("url")?;
                reader.to_string_value("url", url)?
            },
            resize: reader.optional_pair("resize")?,
        }),
        ObjectKind::EmojiLayer => Layer::EmojiLayer(read_emoji(&mut reader)?),
        ObjectKind::PieLayer => Layer::PieLayer(read_pie(&mut reader)?),
        ObjectKind::ListLayer => Layer::ListLayer(read_list(&mut reader)?),
        ObjectKind::RotationLayer => Layer::RotationLayer(read_rotation(&mut reader)?),
    };
    reader.finish();
    Ok(layer)
}

/// Initialize a stored value that must be an object
fn initialize_value(
    value: &mut Value,
    owner: &KwargReader<'_>,
    copies: usize,
) -> Result<Layer, ResolveError> {
    match value {
        Value::Object(object) => initialize_copies(object, copies),
        Value::Variable(_) => {
            let mut concrete = evaluate(value)?;
            initialize_value(&mut concrete, owner, copies)
        }
        other => Err(owner.error(format!("expected a layer, found '{}'", other.type_name()))),
    }
}

/// Initialize a stored sequence of objects
fn initialize_all(value: &mut Value, owner: &KwargReader<'_>) -> Result<Vec<Layer>, ResolveError> {
    match value {
        Value::List(items) | Value::Tuple(items) => items
            .iter_mut()
            .map(|item| initialize_value(item, owner, owner.copies()))
            .collect(),
        Value::Variable(_) => {
            let mut concrete = evaluate(value)?;
            initialize_all(&mut concrete, owner)
        }
        other => Err(owner.error(format!(
            "expected a list of layers, found '{}'",
            other.type_name()
        ))),
    }
}

/// Take a nested object keyword out, initialize it and put it back
fn nested(reader: &mut KwargReader<'_>, key: &str) -> Result<Option<Layer>, ResolveError> {
    let Some(slot) = reader.raw(key) else {
        return Ok(None);
    };
    let mut value = std::mem::take(slot);
    let result = match &value {
        Value::Bool(false) => Ok(None),
        _ => initialize_value(&mut value, reader, reader.copies()).map(Some),
    };
    reader.set(key, value);
    result
}

fn nested_all(reader: &mut KwargReader<'_>, key: &str) -> Result<Option<Vec<Layer>>, ResolveError> {
    let Some(slot) = reader.raw(key) else {
        return Ok(None);
    };
    let mut value = std::mem::take(slot);
    let result = initialize_all(&mut value, reader);
    reader.set(key, value);
    result.map(Some)
}

fn read_align(reader: &mut KwargReader<'_>) -> Result<Align, ResolveError> {
    let align_x = match reader.choice("align_x", "left", &["left", "center", "right"])?.as_str() {
        "center" => HorizontalAlign::Center,
        "right" => HorizontalAlign::Right,
        _ => HorizontalAlign::Left,
    };
    let align_y = match reader.choice("align_y", "top", &["top", "center", "bottom"])?.as_str() {
        "center" => VerticalAlign::Center,
        "bottom" => VerticalAlign::Bottom,
        _ => VerticalAlign::Top,
    };
    Ok(Align {
        pos: reader.pair("pos", (0.0, 0.0))?,
        align_x,
        align_y,
        max_size: reader.pair("max_size", (-1.0, -1.0))?,
    })
}

fn read_direction(reader: &mut KwargReader<'_>, default: &'static str) -> Result<Direction, ResolveError> {
    Ok(match reader.choice("direction", default, &["x", "y"])?.as_str() {
        "y" => Direction::Y,
        _ => Direction::X,
    })
}

fn read_stack(reader: &mut KwargReader<'_>) -> Result<StackLayer, ResolveError> {
    let mut layers = nested_all(reader, "layers")?.unwrap_or_default();
    if layers.is_empty() {
        layers.push(initialize(&mut Object::new(ObjectKind::EmptyLayer))?);
    }
    Ok(StackLayer { layers })
}

fn read_animated(reader: &mut KwargReader<'_>) -> Result<AnimatedStackLayer, ResolveError> {
    let animated = nested(reader, "animated")?
        .ok_or_else(|| reader.error("\"animated\" was not found"))?;
    if animated.kind() != ObjectKind::RotationLayer {
        return Err(reader.error(format!(
            "animated must be a RotationLayer, not {}",
            animated.kind()
        )));
    }
    Ok(AnimatedStackLayer {
        animated: Box::new(animated),
        static_fg: nested(reader, "static_fg")?.map(Box::new),
        static_bg: nested(reader, "static_bg")?.map(Box::new),
        seconds: reader.number("seconds", 5.0)?,
        fps: reader.number("fps", 5.0)?,
        loop_count: reader.integer("loop", 1)?,
        bg_color: reader.color("bg_color")?,
    })
}

fn read_fill(reader: &mut KwargReader<'_>) -> Result<FillLayer, ResolveError> {
    Ok(FillLayer {
        align: read_align(reader)?,
        color: reader.paint("color")?,
        resize: reader.pair("resize", (1.0, 1.0))?,
    })
}

fn read_rectangle(reader: &mut KwargReader<'_>) -> Result<RectangleLayer, ResolveError> {
    Ok(RectangleLayer {
        align: read_align(reader)?,
        color: reader.paint("color")?,
        size: reader.pair("size", (0.0, 0.0))?,
        radius: reader.number("radius", 0.0)?,
        line_width: reader.number("line_width", -1.0)?,
    })
}

fn read_progress(reader: &mut KwargReader<'_>) -> Result<ProgressLayer, ResolveError> {
    let direction = read_direction(reader, "x")?;
    let percentage = reader.number("percentage", 1.0)?;
    let size = reader.required("size")?;
    let (width, height) = reader.to_pair("size", &size)?;
    let scaled = match direction {
        Direction::Y => (width, (height * percentage).trunc()),
        Direction::X => ((width * percentage).trunc(), height),
    };
    reader.set("size", Value::from(scaled));
    Ok(ProgressLayer {
        rectangle: read_rectangle(reader)?,
        direction,
        percentage,
    })
}

fn read_text(reader: &mut KwargReader<'_>) -> Result<TextLayer, ResolveError> {
    let align = read_align(reader)?;
    let color = reader.paint("color")?;
    let font = reader.string("font", "default")?;
    let font_size = reader.number("font_size", 16.0)?;
    let line_margin = reader.number("line_margin", 0.0)?;
    let text_align = match reader.choice("text_align", "left", &["left", "center", "right"])?.as_str() {
        "center" => HorizontalAlign::Center,
        "right" => HorizontalAlign::Right,
        _ => HorizontalAlign::Left,
    };

    let text_lines = match reader.get("text_lines")? {
        None | Some(Value::Bool(false)) => {
            let text = reader.required("text")?.to_string();
            let wrap_limit = reader.integer("wrap_limit", -1)?;
            if wrap_limit > 0 {
                text::wrap(&text, wrap_limit as usize)
            } else {
                vec![text]
            }
        }
        Some(Value::List(lines)) | Some(Value::Tuple(lines)) => {
            lines.iter().map(Value::to_string).collect()
        }
        Some(other) => {
            return Err(reader.error(format!(
                "text_lines must be a list, not '{}'",
                other.type_name()
            )))
        }
    };

    Ok(TextLayer {
        align,
        color,
        font,
        font_size,
        line_margin,
        text_align,
        text_lines,
    })
}

fn read_emoji(reader: &mut KwargReader<'_>) -> Result<EmojiLayer, ResolveError> {
    let align = read_align(reader)?;
    let resize = reader.optional_pair("resize")?;
    let emoji = reader.required("emoji")?.to_string();
    let emoji = if text::is_emoji(&emoji) {
        emoji
    } else {
        text::FALLBACK_EMOJI.to_string()
    };
    Ok(EmojiLayer {
        align,
        emoji,
        resize,
    })
}

fn read_pie(reader: &mut KwargReader<'_>) -> Result<PieLayer, ResolveError> {
    let align = read_align(reader)?;
    let color = reader.paint("color")?;
    let radius = reader.number("radius", 0.0)?;
    let border_width = reader.number("border_width", 1.0)?;
    let line_width = reader.number("line_width", 1.0)?;
    let choices = nested_all(reader, "choices")?
        .ok_or_else(|| reader.error("\"choices\" was not found"))?;
    let choices_radius = reader.number("choices_radius", (radius - border_width) * 0.75)?;
    let rotate_choices = reader.boolean("rotate_choices", true)?;
    Ok(PieLayer {
        align,
        color,
        radius,
        border_width,
        line_width,
        choices,
        choices_radius,
        rotate_choices,
    })
}

fn read_list(reader: &mut KwargReader<'_>) -> Result<ListLayer, ResolveError> {
    let align = read_align(reader)?;
    let repeat = reader.integer("repeat", -1)?;
    if !reader_has(reader, "repeat") {
        return Err(reader.error("\"repeat\" was not found"));
    }
    let repeat = usize::try_from(repeat)
        .map_err(|_| reader.error(format!("repeat must not be negative, got {}", repeat)))?;
    if repeat > MAX_SEQUENCE_LEN {
        return Err(reader.error(format!(
            "repeat must be at most {}, got {}",
            MAX_SEQUENCE_LEN, repeat
        )));
    }
    // Nested lists multiply; bound the total before building anything
    let copies = reader
        .copies()
        .checked_mul(repeat)
        .filter(|copies| *copies <= MAX_REPEATED_LAYERS)
        .ok_or_else(|| {
            reader.error(format!(
                "nested list layers would repeat a template more than {} times",
                MAX_REPEATED_LAYERS
            ))
        })?;

    let mut template = match reader.raw("template") {
        Some(slot) => std::mem::take(slot),
        None => return Err(reader.error("\"template\" was not found")),
    };
    // Re-initializing the same template advances its iterators
    let items = (0..repeat)
        .map(|_| initialize_value(&mut template, reader, copies))
        .collect::<Result<Vec<_>, _>>();
    reader.set("template", template);

    Ok(ListLayer {
        align,
        repeat,
        items: items?,
        direction: read_direction(reader, "y")?,
        margin: reader.number("margin", 0.0)?,
    })
}

fn reader_has(reader: &mut KwargReader<'_>, key: &str) -> bool {
    reader.raw(key).is_some()
}

fn read_rotation(reader: &mut KwargReader<'_>) -> Result<RotationLayer, ResolveError> {
    let rotate = nested(reader, "rotate")?.ok_or_else(|| reader.error("\"rotate\" was not found"))?;
    let rotation = reader.required("rotation")?;
    Ok(RotationLayer {
        rotate: Box::new(rotate),
        rotation: reader.to_number("rotation", &rotation)?,
        bg_color: reader.color("bg_color")?,
    })
}
