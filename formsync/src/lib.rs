//! # formsync
//!
//! Keeps a raw text view and a schema-driven structured view of the same
//! document synchronized.
//!
//! A document is edited either as YAML (or JSON/TOML) text or through form
//! controls generated from a JSON Schema. Each edit fully replaces the other
//! side, invalid text never destroys the last valid value, and neither view
//! ever receives its own edit back.
//!
//! ## Features
//!
//! - Text codecs for YAML, JSON and TOML with stable, idempotent output
//! - JSON Schema driven field tree (`$ref`, nullable unions, enums, ranges)
//! - Validation errors reported per field path, never thrown
//! - Copy-on-write field edits addressed by paths like `sections[0].headline`
//! - Export of the raw text, byte for byte, with timestamped backups
//!
//! ## Quick Start
//!
//! ```rust
//! use formsync::{Schema, Session, SyncConfig, Value};
//!
//! let schema = Schema::try_from(&serde_json::json!({
//!     "type": "object",
//!     "properties": { "title": { "type": "string" } },
//!     "required": ["title"]
//! }))
//! .unwrap();
//!
//! let mut session = Session::new("title: Draft\n", schema, SyncConfig::default()).unwrap();
//! session.on_text_derived(|text| println!("text view <- {text}"));
//!
//! let _ = session.edit_field(&"title".parse().unwrap(), Value::from("Launch"));
//! assert_eq!(session.raw_text(), "title: Launch\n");
//! ```
//!
//! ## Modules
//!
//! - [`codec`] - Text formats
//! - [`config`] - Session configuration
//! - [`data`] - Schema, paths, validation and patches
//! - [`export`] - Export artifacts and save targets
//! - [`sync`] - The synchronization session
//! - [`shared`] - Shared handle for views calling back into a session

#[macro_use]
extern crate log;

/// Text formats of the raw view.
pub mod codec;

/// Session configuration loaded from TOML.
pub mod config;

/// Schema, paths, validation and patches.
pub mod data;

/// Export of the raw text as a downloadable artifact.
pub mod export;

/// Shared, re-entrancy safe session handle.
pub mod shared;

/// The synchronization state machine.
pub mod sync;

pub use codec::{CodecError, Format, TextCodec};
pub use config::{ExportOptions, SyncConfig};
pub use data::{FieldPath, FieldSchema, Schema, ValidationReport};
pub use export::{DirTarget, ExportArtifact, SaveTarget};
pub use serde_json::Value;
pub use shared::{SharedSession, WeakSession};
pub use sync::{Session, Side, Snapshot, SyncError, SyncOutcome, SyncState};
