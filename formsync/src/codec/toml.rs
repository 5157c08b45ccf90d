//! TOML codec implementation.
//!
//! TOML has no `null` and its root must be a table; values outside that
//! shape fail to serialize.

use serde_json::Value;

use crate::codec::{CodecError, Format, line_col, traits::TextCodec};

/// Pretty-printed TOML codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlCodec;

impl TextCodec for TomlCodec {
    fn parse(&self, text: &str) -> Result<Value, CodecError> {
        let v: ::toml::Value = ::toml::from_str(text).map_err(|e| {
            let (line, column) = match e.span() {
                Some(span) => {
                    let (l, c) = line_col(text, span.start);
                    (Some(l), Some(c))
                }
                None => (None, None),
            };
            CodecError::Parse {
                format: Format::Toml,
                reason: e.message().to_string(),
                line,
                column,
            }
        })?;

        serde_json::to_value(v).map_err(|e| CodecError::Parse {
            format: Format::Toml,
            reason: e.to_string(),
            line: None,
            column: None,
        })
    }

    fn serialize(&self, value: &Value) -> Result<String, CodecError> {
        ::toml::to_string_pretty(value).map_err(|e| CodecError::Serialize {
            format: Format::Toml,
            reason: e.to_string(),
        })
    }

    fn format(&self) -> Format {
        Format::Toml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let value = json!({
            "title": "A",
            "sections": [
                {"type": "hero", "headline": "Hi"},
                {"type": "parallax", "strength": 0.5}
            ]
        });
        let text = TomlCodec.serialize(&value).unwrap();
        assert!(text.contains("[[sections]]"));
        let parsed = TomlCodec.parse(&text).unwrap();
        assert_eq!(parsed, value);
        assert_eq!(TomlCodec.serialize(&parsed).unwrap(), text);
    }

    #[test]
    fn test_null_is_unserializable() {
        let err = TomlCodec
            .serialize(&json!({"title": null, "sections": []}))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::Serialize {
                format: Format::Toml,
                ..
            }
        ));
        assert!(TomlCodec.serialize(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_malformed_text() {
        let err = TomlCodec.parse("title = \"A\"\nsections = [\n").unwrap_err();
        match err {
            CodecError::Parse { line, .. } => assert!(line.is_some()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
