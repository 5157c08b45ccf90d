//! Text codec interface definitions.

use serde_json::Value;

use crate::codec::{CodecError, Format};

/// Converts between raw text and the structured value.
///
/// Implementations are stateless; one instance can serve any number of
/// sessions.
pub trait TextCodec: Send + Sync {
    /// Parses text into a structured value.
    ///
    /// Only malformed text is an error. Content that merely breaks the
    /// schema parses successfully and is reported by validation.
    fn parse(&self, text: &str) -> Result<Value, CodecError>;

    /// Serializes a structured value into self-contained text that
    /// [`TextCodec::parse`] reads back to an equal value.
    fn serialize(&self, value: &Value) -> Result<String, CodecError>;

    /// Returns the text format handled by this codec.
    fn format(&self) -> Format;

    /// Returns the name of the codec.
    fn name(&self) -> &'static str {
        self.format().name()
    }
}
