//! Text codecs.
//!
//! Provides a unified interface for the supported text formats: YAML, JSON
//! and TOML.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod json;
pub mod toml;
pub mod traits;
pub mod yaml;

pub use self::json::JsonCodec;
pub use self::toml::TomlCodec;
pub use self::traits::TextCodec;
pub use self::yaml::YamlCodec;

/// Errors produced while converting between text and values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text is not well-formed in its format.
    #[error("{format} parse error{}: {reason}", location(.line, .column))]
    Parse {
        format: Format,
        reason: String,
        /// 1-based line of the failure, when the parser reports one.
        line: Option<usize>,
        /// 1-based column of the failure, when the parser reports one.
        column: Option<usize>,
    },
    /// The value has a shape the format cannot express.
    #[error("{format} serialize error: {reason}")]
    Serialize { format: Format, reason: String },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(l), Some(c)) => format!(" at line {l} column {c}"),
        (Some(l), None) => format!(" at line {l}"),
        _ => String::new(),
    }
}

impl CodecError {
    pub fn format(&self) -> Format {
        match self {
            CodecError::Parse { format, .. } | CodecError::Serialize { format, .. } => *format,
        }
    }
}

/// Text format of the raw view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
        }
    }

    /// File extension used for exported artifacts.
    pub fn extension(&self) -> &'static str {
        self.name()
    }

    /// MIME type label used for exported artifacts.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Yaml => "text/yaml",
            Format::Json => "application/json",
            Format::Toml => "application/toml",
        }
    }

    /// Detects the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "toml" | "tml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// Returns the codec for this format.
    pub fn codec(&self) -> Box<dyn TextCodec> {
        match self {
            Format::Yaml => Box::new(YamlCodec),
            Format::Json => Box::new(JsonCodec),
            Format::Toml => Box::new(TomlCodec),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Converts a byte offset into 1-based line and column numbers.
pub(crate) fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text.as_bytes()[..offset];
    let line = before.iter().filter(|b| **b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |pos| pos + 1);
    (line, offset - line_start + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata() {
        assert_eq!(Format::default(), Format::Yaml);
        assert_eq!(Format::Yaml.mime_type(), "text/yaml");
        assert_eq!(Format::from_extension("YML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("tml"), Some(Format::Toml));
        assert_eq!(Format::from_extension("ini"), None);
        assert_eq!(Format::Json.codec().format(), Format::Json);
        assert_eq!(Format::Toml.codec().name(), "toml");
    }

    #[test]
    fn test_line_col() {
        let text = "a: 1\nbb: [\n";
        assert_eq!(line_col(text, 0), (1, 1));
        assert_eq!(line_col(text, 5), (2, 1));
        assert_eq!(line_col(text, 9), (2, 5));
    }

    #[test]
    fn test_error_display() {
        let err = CodecError::Parse {
            format: Format::Yaml,
            reason: "bad".into(),
            line: Some(2),
            column: Some(3),
        };
        assert_eq!(err.to_string(), "yaml parse error at line 2 column 3: bad");
        assert_eq!(err.format(), Format::Yaml);
    }
}
