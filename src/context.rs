//! Loading resolution contexts from JSON or TOML documents

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::value::Value;

/// Errors that can occur when loading a context
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Failed to read context file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse context JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to parse context TOML: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Document format of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFormat {
    Json,
    Toml,
}

impl ContextFormat {
    /// `.toml` files are TOML, everything else is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ContextFormat::Toml,
            _ => ContextFormat::Json,
        }
    }
}

/// Load a context file, picking the format from its extension
pub fn from_file(path: &Path) -> Result<Value, ContextError> {
    let content = std::fs::read_to_string(path)?;
    let format = ContextFormat::from_path(path);
    debug!(path = %path.display(), ?format, "loading context");
    from_str(&content, format)
}

pub fn from_str(content: &str, format: ContextFormat) -> Result<Value, ContextError> {
    Ok(match format {
        ContextFormat::Json => serde_json::from_str::<serde_json::Value>(content)?.into(),
        ContextFormat::Toml => content.parse::<toml::Table>()?.into(),
    })
}

impl From<toml::Table> for Value {
    fn from(table: toml::Table) -> Self {
        toml::Value::Table(table).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_context() {
        let value = from_str(r#"{"name": "ada", "scores": [1, 2.5], "ok": true, "x": null}"#, ContextFormat::Json)
            .expect("valid JSON");
        let expected: Value = [
            ("name", Value::from("ada")),
            ("scores", Value::List(vec![Value::Int(1), Value::Float(2.5)])),
            ("ok", Value::Bool(true)),
            ("x", Value::None),
        ]
        .into_iter()
        .collect();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_toml_context() {
        let value = from_str("name = \"ada\"\n[user]\nlevel = 3\n", ContextFormat::Toml)
            .expect("valid TOML");
        let user: Value = [("level", 3)].into_iter().collect();
        let expected: Value = [("name", Value::from("ada")), ("user", user)]
            .into_iter()
            .collect();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            from_str("{", ContextFormat::Json),
            Err(ContextError::JsonError(_))
        ));
        assert!(matches!(
            from_str("= 1", ContextFormat::Toml),
            Err(ContextError::TomlError(_))
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ContextFormat::from_path(Path::new("ctx.TOML")), ContextFormat::Toml);
        assert_eq!(ContextFormat::from_path(Path::new("ctx.json")), ContextFormat::Json);
        assert_eq!(ContextFormat::from_path(Path::new("ctx")), ContextFormat::Json);
    }
}
