//! JSON codec implementation.

use serde_json::Value;

use crate::codec::{CodecError, Format, traits::TextCodec};

/// Pretty-printed JSON codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl TextCodec for JsonCodec {
    fn parse(&self, text: &str) -> Result<Value, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Parse {
            format: Format::Json,
            reason: e.to_string(),
            line: (e.line() > 0).then_some(e.line()),
            column: (e.line() > 0).then_some(e.column()),
        })
    }

    fn serialize(&self, value: &Value) -> Result<String, CodecError> {
        let mut out = serde_json::to_string_pretty(value).map_err(|e| CodecError::Serialize {
            format: Format::Json,
            reason: e.to_string(),
        })?;
        out.push('\n');
        Ok(out)
    }

    fn format(&self) -> Format {
        Format::Json
    }
}
