//! Document data structures: schema, field paths, validation and patches.
//!
//! ## Architecture
//!
//! The data module is organized into several submodules:
//!
//! - [`path`] - Addressing of individual fields
//! - [`schema`] - Field schema tree and JSON Schema reader
//! - [`validate`] - Checking a value against a schema
//! - [`patch`] - Copy-on-write edits of a value

/// Addressing of fields inside a document.
pub mod path;

/// Field schema tree and JSON Schema reader.
pub mod schema;

/// Validation of a value against a schema.
pub mod validate;

/// Structural edits that return a new value.
pub mod patch;

pub use path::{FieldPath, PathSegment};
pub use schema::{FieldKind, FieldSchema, Schema, SchemaError};
pub use validate::{Rule, ValidationReport, Violation, validate};
