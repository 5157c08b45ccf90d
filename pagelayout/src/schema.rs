//! Schema of the page layout document.
//!
//! The schema is kept as a JSON Schema literal so the structured view can
//! label its controls; [`crate::layout::PageLayout`] is the typed
//! counterpart used by Rust code.

use formsync::{Schema, data::SchemaError};
use serde_json::{Value, json};

/// Allowed values of a section's `type`.
pub const SECTION_TYPES: [&str; 4] = ["hero", "feature", "parallax", "footer"];

/// The page JSON Schema as a value.
pub fn page_schema_json() -> Value {
    json!({
        "type": "object",
        "title": "Page",
        "required": ["title", "sections"],
        "properties": {
            "title": { "type": "string", "title": "Page title" },
            "sections": {
                "type": "array",
                "title": "Sections",
                "items": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": SECTION_TYPES,
                            "title": "Section type"
                        },
                        "bg_image": { "type": "string", "title": "Background image URL" },
                        "headline": { "type": "string", "title": "Headline" },
                        "subtext": { "type": "string", "title": "Subtext" },
                        "bg_color": { "type": "string", "title": "Background color" },
                        "items": {
                            "type": "array",
                            "title": "Features",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "title": { "type": "string", "title": "Feature name" },
                                    "text": { "type": "string", "title": "Description" }
                                }
                            }
                        },
                        "strength": {
                            "type": "number",
                            "title": "Parallax strength",
                            "minimum": 0,
                            "maximum": 1
                        }
                    }
                }
            }
        }
    })
}

/// Reads [`page_schema_json`] into a field tree.
pub fn page_schema() -> Result<Schema, SchemaError> {
    Schema::try_from(&page_schema_json())
}
