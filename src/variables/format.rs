//! Format templates: `{}` / `{N}` placeholders with an optional
//! `:[[fill]align][width][.precision][type]` spec

use thiserror::Error;

use crate::config::MAX_STRING_LEN;
use crate::value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Single '{0}' encountered in format string")]
    Unbalanced(char),

    #[error("Replacement index {0} out of range for positional args tuple")]
    IndexOutOfRange(usize),

    #[error("cannot switch between automatic and manual field numbering")]
    MixedNumbering,

    #[error("unsupported replacement field '{0}'")]
    UnsupportedField(String),

    #[error("Invalid format specifier '{0}'")]
    InvalidSpec(String),

    #[error("Unknown format code '{code}' for object of type '{type_name}'")]
    UnknownCode { code: char, type_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Default)]
struct Spec {
    fill: Option<char>,
    align: Option<Align>,
    width: usize,
    precision: Option<usize>,
    code: Option<char>,
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    }
}

/// Width and precision are capped at the longest string a template may hold
fn parse_spec(raw: &str) -> Result<Spec, FormatError> {
    let invalid = || FormatError::InvalidSpec(raw.to_string());
    let bounded = |digits: String| {
        digits
            .parse::<usize>()
            .ok()
            .filter(|n| *n <= MAX_STRING_LEN)
            .ok_or_else(invalid)
    };
    let chars: Vec<char> = raw.chars().collect();
    let mut spec = Spec::default();
    let mut i = 0;

    if chars.len() >= 2 && align_of(chars[1]).is_some() {
        spec.fill = Some(chars[0]);
        spec.align = align_of(chars[1]);
        i = 2;
    } else if let Some(align) = chars.first().and_then(|c| align_of(*c)) {
        spec.align = Some(align);
        i = 1;
    }

    if chars.get(i) == Some(&'0') && spec.align.is_none() {
        spec.fill = Some('0');
        spec.align = Some(Align::Right);
        i += 1;
    }

    let start = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    if i > start {
        let digits: String = chars[start..i].iter().collect();
        spec.width = bounded(digits)?;
    }

    if chars.get(i) == Some(&'.') {
        i += 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i == start {
            return Err(invalid());
        }
        let digits: String = chars[start..i].iter().collect();
        spec.precision = Some(bounded(digits)?);
    }

    match &chars[i..] {
        [] => {}
        [code] => spec.code = Some(*code),
        _ => return Err(invalid()),
    }
    Ok(spec)
}

fn render(value: &Value, spec: &Spec) -> Result<String, FormatError> {
    let unknown = |code| FormatError::UnknownCode {
        code,
        type_name: value.type_name(),
    };
    let is_number = matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_));

    let body = match (spec.code, value) {
        (Some('d'), Value::Int(_) | Value::Bool(_)) => value
            .as_i64()
            .map(|n| n.to_string())
            .ok_or_else(|| unknown('d'))?,
        (Some('d'), _) => return Err(unknown('d')),
        (Some('f'), _) => {
            let x = value.as_f64().ok_or_else(|| unknown('f'))?;
            format!("{:.*}", spec.precision.unwrap_or(6), x)
        }
        (Some('%'), _) => {
            let x = value.as_f64().ok_or_else(|| unknown('%'))?;
            format!("{:.*}%", spec.precision.unwrap_or(6), x * 100.0)
        }
        (Some('s'), Value::Str(s)) | (None, Value::Str(s)) => match spec.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.clone(),
        },
        (Some('s'), _) => return Err(unknown('s')),
        (None, Value::Float(x)) if spec.precision.is_some() => {
            format!("{:.*}", spec.precision.unwrap_or(6), x)
        }
        (None, _) => value.to_string(),
        (Some(code), _) => return Err(unknown(code)),
    };

    let len = body.chars().count();
    if len >= spec.width {
        return Ok(body);
    }
    let pad = spec.width - len;
    let fill = spec.fill.unwrap_or(' ');
    let align = spec
        .align
        .unwrap_or(if is_number { Align::Right } else { Align::Left });
    let padding = |n: usize| fill.to_string().repeat(n);
    Ok(match align {
        Align::Left => format!("{}{}", body, padding(pad)),
        Align::Right => format!("{}{}", padding(pad), body),
        Align::Center => format!("{}{}{}", padding(pad / 2), body, padding(pad - pad / 2)),
    })
}

/// Substitute `args` into `template`
pub fn format(template: &str, args: &[Value]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut auto_index = 0usize;
    let mut numbering: Option<bool> = None;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(FormatError::Unbalanced('}')),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(FormatError::Unbalanced('{')),
                        Some(c) => field.push(c),
                    }
                }
                let (name, spec) = match field.split_once(':') {
                    Some((name, spec)) => (name, spec),
                    None => (field.as_str(), ""),
                };

                let manual = !name.is_empty();
                if *numbering.get_or_insert(manual) != manual {
                    return Err(FormatError::MixedNumbering);
                }
                let index = if manual {
                    name.parse::<usize>()
                        .map_err(|_| FormatError::UnsupportedField(name.to_string()))?
                } else {
                    auto_index += 1;
                    auto_index - 1
                };

                let value = args.get(index).ok_or(FormatError::IndexOutOfRange(index))?;
                out.push_str(&render(value, &parse_spec(spec)?)?);
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_placeholders() {
        let args = [Value::from("ada"), Value::Int(3)];
        assert_eq!(format("{} has {}", &args).as_deref(), Ok("ada has 3"));
        assert_eq!(format("{1}/{0}", &args).as_deref(), Ok("3/ada"));
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(
            format("{{{}}}", &[Value::Int(1)]).as_deref(),
            Ok("{1}")
        );
    }

    #[test]
    fn test_specs() {
        assert_eq!(format("{:.2f}", &[Value::Float(3.14159)]).as_deref(), Ok("3.14"));
        assert_eq!(format("{:5d}", &[Value::Int(42)]).as_deref(), Ok("   42"));
        assert_eq!(format("{:03d}", &[Value::Int(7)]).as_deref(), Ok("007"));
        assert_eq!(format("{:*^7}", &[Value::from("ab")]).as_deref(), Ok("**ab***"));
        assert_eq!(format("{:<4}|", &[Value::Int(1)]).as_deref(), Ok("1   |"));
        assert_eq!(format("{:.0%}", &[Value::Float(0.25)]).as_deref(), Ok("25%"));
        assert_eq!(format("{:.3}", &[Value::from("abcdef")]).as_deref(), Ok("abc"));
    }

    #[test]
    fn test_float_default_is_host_style() {
        assert_eq!(format("{}", &[Value::Float(2.0)]).as_deref(), Ok("2.0"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            format("{} {}", &[Value::Int(1)]),
            Err(FormatError::IndexOutOfRange(1))
        );
        assert_eq!(
            format("{} {0}", &[Value::Int(1)]),
            Err(FormatError::MixedNumbering)
        );
        assert_eq!(format("{", &[]), Err(FormatError::Unbalanced('{')));
        assert_eq!(
            format("{:501}", &[Value::Int(1)]),
            Err(FormatError::InvalidSpec("501".into()))
        );
        assert_eq!(
            format("{:.99999999999999999999f}", &[Value::Float(0.5)]),
            Err(FormatError::InvalidSpec(".99999999999999999999f".into()))
        );
        assert_eq!(format("{:>500}", &[Value::Int(1)]).map(|s| s.len()), Ok(500));
        assert_eq!(format("}", &[]), Err(FormatError::Unbalanced('}')));
        assert!(matches!(
            format("{:d}", &[Value::from("x")]),
            Err(FormatError::UnknownCode { code: 'd', .. })
        ));
        assert!(matches!(
            format("{name}", &[Value::Int(1)]),
            Err(FormatError::UnsupportedField(_))
        ));
    }
}
