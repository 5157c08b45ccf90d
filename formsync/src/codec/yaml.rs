//! YAML codec implementation.
//!
//! Provides YAML parsing and serialization using the serde_yaml library.
//! Aliases in the input are expanded while parsing and the serializer never
//! emits anchors, so output text is always self-contained.

use serde_json::Value;

use crate::codec::{CodecError, Format, traits::TextCodec};

/// YAML codec. A blank document parses to `null`.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlCodec;

impl TextCodec for YamlCodec {
    fn parse(&self, text: &str) -> Result<Value, CodecError> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
            let location = e.location();
            CodecError::Parse {
                format: Format::Yaml,
                reason: e.to_string(),
                line: location.as_ref().map(|l| l.line()),
                column: location.as_ref().map(|l| l.column()),
            }
        })?;

        // `.nan` and `.inf` have no structured counterpart and would
        // otherwise turn into `null`.
        if let Some(path) = non_finite(&doc, "") {
            return Err(CodecError::Parse {
                format: Format::Yaml,
                reason: format!("non-finite number at `{path}` is not supported"),
                line: None,
                column: None,
            });
        }

        serde_json::to_value(doc).map_err(|e| CodecError::Parse {
            format: Format::Yaml,
            reason: e.to_string(),
            line: None,
            column: None,
        })
    }

    fn serialize(&self, value: &Value) -> Result<String, CodecError> {
        serde_yaml::to_string(value).map_err(|e| CodecError::Serialize {
            format: Format::Yaml,
            reason: e.to_string(),
        })
    }

    fn format(&self) -> Format {
        Format::Yaml
    }
}

/// Finds the first `.nan`/`.inf` in `value`.
fn non_finite(value: &serde_yaml::Value, path: &str) -> Option<String> {
    match value {
        serde_yaml::Value::Number(n) => n
            .as_f64()
            .filter(|f| !f.is_finite())
            .map(|_| path.to_string()),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| non_finite(item, &format!("{path}[{i}]"))),
        serde_yaml::Value::Mapping(map) => map.iter().find_map(|(k, v)| {
            let key = k.as_str().map_or_else(|| format!("{k:?}"), str::to_string);
            let child = if path.is_empty() {
                key
            } else {
                format!("{path}.{key}")
            };
            non_finite(v, &child)
        }),
        serde_yaml::Value::Tagged(tagged) => non_finite(&tagged.value, path),
        _ => None,
    }
}
