//! Synchronization session between the raw text view and the structured
//! view.
//!
//! A [`Session`] owns the raw text and the structured value of one document.
//! Each edit fully replaces the other side (last writer wins); the side
//! derived from an edit is pushed to the listeners of the *other* view only,
//! so a view never receives its own edit back as a new change.
//!
//! ```text
//! text_changed ──parse──▶ value ──▶ value listeners
//! structured_changed ──serialize──▶ raw text ──▶ text listeners
//! ```

use std::{fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::{
    codec::{CodecError, Format, TextCodec},
    config::SyncConfig,
    data::{
        patch::{self, PatchError},
        path::FieldPath,
        schema::{FieldSchema, Schema},
        validate::{Rule, ValidationReport, validate},
    },
    export::{ExportArtifact, export_text},
};

/// Callback receiving raw text derived from a structured edit.
pub type TextListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Callback receiving a value derived from a text edit.
pub type ValueListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Callback receiving the validation report after each edit.
pub type ReportListener = Arc<dyn Fn(&ValidationReport) + Send + Sync>;

/// Transition currently in progress.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    ApplyingTextEdit,
    ApplyingStructuredEdit,
}

/// Which view authored the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Text,
    Structured,
}

/// Recoverable failures of a synchronization step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("text does not parse: {0}")]
    Parse(CodecError),
    #[error("value cannot be written as text: {0}")]
    Serialize(CodecError),
    #[error("structured edit rejected: {0}")]
    Patch(#[from] PatchError),
}

/// Result of dispatching one edit.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The edit was accepted and the other side re-derived.
    Applied,
    /// The edit carried what the session already holds, typically a view
    /// echoing a derived update back.
    Unchanged,
    /// The edit arrived while another one was being applied and was dropped.
    Suppressed,
    /// The edit failed; the previous state of the derived side is kept.
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied)
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Read-only copy of a session's state for views.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub raw_text: String,
    pub value: Value,
    pub report: ValidationReport,
    pub version: u64,
}

/// Authoritative state of one document edited through two views.
pub struct Session {
    schema: Schema,
    codec: Box<dyn TextCodec>,
    config: SyncConfig,
    raw_text: String,
    value: Value,
    report: ValidationReport,
    state: SyncState,
    authored_by: Side,
    version: u64,
    last_error: Option<SyncError>,
    text_listeners: Vec<TextListener>,
    value_listeners: Vec<ValueListener>,
    report_listeners: Vec<ReportListener>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("format", &self.config.format)
            .field("state", &self.state)
            .field("authored_by", &self.authored_by)
            .field("version", &self.version)
            .field("raw_text", &self.raw_text)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Starts a session from its initial text.
    ///
    /// The initial text is supplied by the application, not typed by a user,
    /// so a parse failure here is returned to the caller instead of being
    /// absorbed.
    pub fn new(
        initial_text: impl Into<String>,
        schema: Schema,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        let raw_text = initial_text.into();
        let codec = config.format.codec();
        let value = codec.parse(&raw_text).map_err(SyncError::Parse)?;
        Ok(Self::assemble(schema, codec, config, raw_text, value, Side::Text))
    }

    /// Starts a session from an initial value, deriving the text.
    pub fn from_value(value: Value, schema: Schema, config: SyncConfig) -> Result<Self, SyncError> {
        let codec = config.format.codec();
        let raw_text = codec.serialize(&value).map_err(SyncError::Serialize)?;
        Ok(Self::assemble(schema, codec, config, raw_text, value, Side::Structured))
    }

    fn assemble(
        schema: Schema,
        codec: Box<dyn TextCodec>,
        config: SyncConfig,
        raw_text: String,
        value: Value,
        authored_by: Side,
    ) -> Self {
        let report = validate(&value, &schema);
        debug!(
            "session opened: {} bytes of {}, {} violations",
            raw_text.len(),
            codec.name(),
            report.len()
        );
        Self {
            schema,
            codec,
            config,
            raw_text,
            value,
            report,
            state: SyncState::Idle,
            authored_by,
            version: 0,
            last_error: None,
            text_listeners: Vec::new(),
            value_listeners: Vec::new(),
            report_listeners: Vec::new(),
        }
    }

    /// Registers the text view: called with text derived from structured
    /// edits.
    pub fn on_text_derived(&mut self, listener: impl Fn(&str) + Send + Sync + 'static) {
        self.text_listeners.push(Arc::new(listener));
    }

    /// Registers the structured view: called with values derived from text
    /// edits.
    pub fn on_value_derived(&mut self, listener: impl Fn(&Value) + Send + Sync + 'static) {
        self.value_listeners.push(Arc::new(listener));
    }

    /// Registers a consumer of validation reports (inline form errors).
    pub fn on_validated(&mut self, listener: impl Fn(&ValidationReport) + Send + Sync + 'static) {
        self.report_listeners.push(Arc::new(listener));
    }

    /// Applies an edit made in the text view.
    ///
    /// On success the parsed value always replaces the current one, so key
    /// order typed in the text survives later structured edits. The
    /// structured listeners are notified once, only if the content changed. On a parse error
    /// the typed text is kept as the raw text, the last valid value is kept,
    /// and nothing is pushed to either view.
    pub fn text_changed(&mut self, text: impl Into<String>) -> SyncOutcome {
        let text = text.into();
        if self.state != SyncState::Idle {
            debug!("text edit dropped while {:?}", self.state);
            return SyncOutcome::Suppressed;
        }
        if text == self.raw_text {
            return SyncOutcome::Unchanged;
        }

        self.state = SyncState::ApplyingTextEdit;
        let parsed = self.codec.parse(&text);
        self.raw_text = text;
        self.authored_by = Side::Text;
        self.version += 1;

        let outcome = match parsed {
            Ok(value) => {
                self.last_error = None;
                // Map equality ignores key order, so a reordering is stored
                // without a structured re-render.
                let changed = value != self.value;
                self.value = value;
                if changed {
                    for listener in &self.value_listeners {
                        listener(&self.value);
                    }
                }
                self.refresh_report(changed);
                SyncOutcome::Applied
            }
            Err(e) => {
                debug!("keeping last valid value: {e}");
                let err = SyncError::Parse(e);
                self.last_error = Some(err.clone());
                SyncOutcome::Failed(err)
            }
        };

        self.state = SyncState::Idle;
        outcome
    }

    /// Applies an edit made in the structured view.
    ///
    /// On success the raw text is re-derived and the text listeners are
    /// notified once. If the value cannot be written in the current format,
    /// both sides keep their previous state and the problem is published as
    /// an [`Rule::Unserializable`] violation.
    pub fn structured_changed(&mut self, value: Value) -> SyncOutcome {
        if self.state != SyncState::Idle {
            debug!("structured edit dropped while {:?}", self.state);
            return SyncOutcome::Suppressed;
        }
        if value == self.value {
            // Clears a report left by a rejected edit this one reverts.
            self.refresh_report(false);
            return SyncOutcome::Unchanged;
        }

        self.state = SyncState::ApplyingStructuredEdit;
        let outcome = match self.codec.serialize(&value) {
            Ok(text) => {
                self.value = value;
                self.raw_text = text;
                self.authored_by = Side::Structured;
                self.version += 1;
                self.last_error = None;
                self.report = validate(&self.value, &self.schema);
                for listener in &self.text_listeners {
                    listener(&self.raw_text);
                }
                self.publish_report();
                SyncOutcome::Applied
            }
            Err(e) => {
                warn!("structured edit not written as {}: {e}", self.codec.name());
                let mut report = validate(&value, &self.schema);
                report.push(
                    FieldPath::root(),
                    Rule::Unserializable {
                        reason: e.to_string(),
                    },
                );
                self.report = report;
                self.publish_report();
                SyncOutcome::Failed(SyncError::Serialize(e))
            }
        };

        self.state = SyncState::Idle;
        outcome
    }

    /// Replaces one field of the current value.
    pub fn edit_field(&mut self, path: &FieldPath, value: Value) -> SyncOutcome {
        let patched = patch::replace_at(&self.value, path, value);
        self.apply_patch(patched)
    }

    /// Inserts an element into an array (or a key into an object).
    pub fn insert_item(&mut self, path: &FieldPath, value: Value) -> SyncOutcome {
        let patched = patch::insert_at(&self.value, path, value);
        self.apply_patch(patched)
    }

    /// Appends a new element, built from the schema, to the array at
    /// `array_path`.
    pub fn append_item(&mut self, array_path: &FieldPath) -> SyncOutcome {
        let len = match array_path.get(&self.value) {
            Some(Value::Array(items)) => items.len(),
            Some(_) => {
                return SyncOutcome::Failed(SyncError::Patch(PatchError::NotAContainer {
                    path: array_path.to_string(),
                    segment: "appended element".to_string(),
                }));
            }
            None => {
                return SyncOutcome::Failed(SyncError::Patch(PatchError::MissingField {
                    path: array_path.to_string(),
                }));
            }
        };
        let item_path = array_path.index(len);
        let item = self
            .schema
            .field(&item_path)
            .map_or(Value::Null, FieldSchema::skeleton);
        self.insert_item(&item_path, item)
    }

    /// Removes a field or array element.
    pub fn remove_field(&mut self, path: &FieldPath) -> SyncOutcome {
        let patched = patch::remove_at(&self.value, path);
        self.apply_patch(patched)
    }

    fn apply_patch(&mut self, patched: Result<Value, PatchError>) -> SyncOutcome {
        if self.state != SyncState::Idle {
            return SyncOutcome::Suppressed;
        }
        match patched {
            Ok(value) => self.structured_changed(value),
            Err(e) => {
                debug!("patch rejected: {e}");
                SyncOutcome::Failed(SyncError::Patch(e))
            }
        }
    }

    /// Switches the text format, re-deriving the raw text from the current
    /// value.
    ///
    /// Unparseable text pending in the text view is replaced by the last
    /// valid value. If the value cannot be written in `format`, the session
    /// stays in its current format.
    pub fn convert(&mut self, format: Format) -> SyncOutcome {
        if self.state != SyncState::Idle {
            return SyncOutcome::Suppressed;
        }
        if format == self.config.format {
            return SyncOutcome::Unchanged;
        }

        self.state = SyncState::ApplyingStructuredEdit;
        let codec = format.codec();
        let outcome = match codec.serialize(&self.value) {
            Ok(text) => {
                info!("converted document from {} to {format}", self.config.format);
                self.codec = codec;
                self.config.format = format;
                self.raw_text = text;
                self.authored_by = Side::Structured;
                self.version += 1;
                self.last_error = None;
                for listener in &self.text_listeners {
                    listener(&self.raw_text);
                }
                self.refresh_report(false);
                SyncOutcome::Applied
            }
            Err(e) => {
                warn!("cannot convert to {format}: {e}");
                SyncOutcome::Failed(SyncError::Serialize(e))
            }
        };
        self.state = SyncState::Idle;
        outcome
    }

    /// Returns to [`SyncState::Idle`] after a listener panicked mid-transition.
    pub(crate) fn recover(&mut self) {
        self.state = SyncState::Idle;
    }

    /// Revalidates the current value; listeners hear about it when `force`
    /// is set or the report differs from the published one.
    fn refresh_report(&mut self, force: bool) {
        let report = validate(&self.value, &self.schema);
        if force || report != self.report {
            self.report = report;
            self.publish_report();
        }
    }

    fn publish_report(&self) {
        for listener in &self.report_listeners {
            listener(&self.report);
        }
    }

    /// Wraps the current raw text, valid or not, as a download artifact.
    pub fn export(&self) -> ExportArtifact {
        export_text(&self.raw_text, &self.config.export, self.config.format)
    }

    /// Deserializes the current value into a typed structure.
    pub fn typed<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            raw_text: self.raw_text.clone(),
            value: self.value.clone(),
            report: self.report.clone(),
            version: self.version,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value of a single field.
    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.value)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Report of the latest edit.
    ///
    /// After a failed structured edit this describes the rejected value.
    pub fn validation(&self) -> &ValidationReport {
        &self.report
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn authored_by(&self) -> Side {
        self.authored_by
    }

    /// Increments on every accepted change of the raw text or the value.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn format(&self) -> Format {
        self.config.format
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Parse error of the raw text while it does not parse.
    ///
    /// Rejected structured edits and patches are only reported through
    /// their [`SyncOutcome`]; they leave both sides consistent.
    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    /// Whether the raw text parses to the current value.
    pub fn is_settled(&self) -> bool {
        self.last_error.is_none()
    }
}
