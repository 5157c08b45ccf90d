//! Structural edits producing new values.
//!
//! Every operation takes the current value by reference and returns an
//! edited copy, so snapshots handed out to views are never changed under
//! their feet.

use serde_json::Value;
use thiserror::Error;

use crate::data::path::{FieldPath, PathSegment};

/// Errors raised when a patch cannot be applied at the requested path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// An intermediate key does not exist.
    #[error("no field at {path}")]
    MissingField { path: String },
    /// An index points past the end of a sequence.
    #[error("index {index} out of bounds at {path} (len {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
    /// The parent of the addressed field is a scalar, or a key was used on a
    /// sequence (or an index on a mapping).
    #[error("{path} is not a container for {segment}")]
    NotAContainer { path: String, segment: String },
    /// The operation needs a parent but the path is the root.
    #[error("operation needs a non-root path")]
    Root,
}

/// Replaces (or inserts, for a missing mapping key) the value at `path`.
///
/// Replacing at the root returns `new` itself.
pub fn replace_at(value: &Value, path: &FieldPath, new: Value) -> Result<Value, PatchError> {
    let Some((parent, last)) = path.split_last() else {
        return Ok(new);
    };
    let mut out = value.clone();
    match (container_mut(&mut out, &parent)?, last) {
        (Value::Object(map), PathSegment::Key(k)) => {
            map.insert(k.clone(), new);
        }
        (Value::Array(arr), PathSegment::Index(i)) => {
            let len = arr.len();
            let slot = arr.get_mut(*i).ok_or(PatchError::IndexOutOfBounds {
                path: parent.to_string(),
                index: *i,
                len,
            })?;
            *slot = new;
        }
        (_, seg) => return Err(not_a_container(&parent, seg)),
    }
    Ok(out)
}

/// Inserts `new` into the sequence addressed by the parent of `path`, at the
/// index named by its last segment (which may equal the sequence length).
pub fn insert_at(value: &Value, path: &FieldPath, new: Value) -> Result<Value, PatchError> {
    let (parent, last) = path.split_last().ok_or(PatchError::Root)?;
    let mut out = value.clone();
    match (container_mut(&mut out, &parent)?, last) {
        (Value::Array(arr), PathSegment::Index(i)) => {
            if *i > arr.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: parent.to_string(),
                    index: *i,
                    len: arr.len(),
                });
            }
            arr.insert(*i, new);
        }
        (Value::Object(map), PathSegment::Key(k)) => {
            map.insert(k.clone(), new);
        }
        (_, seg) => return Err(not_a_container(&parent, seg)),
    }
    Ok(out)
}

/// Removes the field or sequence element at `path`.
pub fn remove_at(value: &Value, path: &FieldPath) -> Result<Value, PatchError> {
    let (parent, last) = path.split_last().ok_or(PatchError::Root)?;
    let mut out = value.clone();
    match (container_mut(&mut out, &parent)?, last) {
        (Value::Object(map), PathSegment::Key(k)) => {
            map.shift_remove(k).ok_or_else(|| PatchError::MissingField {
                path: path.to_string(),
            })?;
        }
        (Value::Array(arr), PathSegment::Index(i)) => {
            if *i >= arr.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: parent.to_string(),
                    index: *i,
                    len: arr.len(),
                });
            }
            arr.remove(*i);
        }
        (_, seg) => return Err(not_a_container(&parent, seg)),
    }
    Ok(out)
}

fn container_mut<'a>(root: &'a mut Value, path: &FieldPath) -> Result<&'a mut Value, PatchError> {
    let mut cur = root;
    let mut walked = FieldPath::root();
    for seg in path.segments() {
        cur = match (cur, seg) {
            (Value::Object(map), PathSegment::Key(k)) => {
                map.get_mut(k).ok_or_else(|| PatchError::MissingField {
                    path: walked.key(k.as_str()).to_string(),
                })?
            }
            (Value::Array(arr), PathSegment::Index(i)) => {
                let len = arr.len();
                arr.get_mut(*i).ok_or_else(|| PatchError::IndexOutOfBounds {
                    path: walked.to_string(),
                    index: *i,
                    len,
                })?
            }
            (_, seg) => return Err(not_a_container(&walked, seg)),
        };
        walked = match seg {
            PathSegment::Key(k) => walked.key(k.as_str()),
            PathSegment::Index(i) => walked.index(*i),
        };
    }
    Ok(cur)
}

fn not_a_container(parent: &FieldPath, seg: &PathSegment) -> PatchError {
    PatchError::NotAContainer {
        path: parent.to_string(),
        segment: match seg {
            PathSegment::Key(k) => format!("key {k:?}"),
            PathSegment::Index(i) => format!("index {i}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_replace_leaves_input_untouched() {
        let before = json!({"title": "A", "sections": [{"type": "hero", "headline": "Hi"}]});
        let after = replace_at(&before, &p("sections[0].headline"), json!("Hello")).unwrap();

        assert_eq!(before["sections"][0]["headline"], "Hi");
        assert_eq!(after["sections"][0]["headline"], "Hello");
        assert_eq!(after["title"], "A");
    }

    #[test]
    fn test_replace_inserts_missing_key() {
        let before = json!({"sections": [{"type": "hero"}]});
        let after = replace_at(&before, &p("sections[0].subtext"), json!("sub")).unwrap();
        assert_eq!(after, json!({"sections": [{"type": "hero", "subtext": "sub"}]}));
        assert_eq!(replace_at(&before, &FieldPath::root(), json!(1)).unwrap(), json!(1));
    }

    #[test]
    fn test_replace_errors() {
        let doc = json!({"title": "A", "sections": []});
        assert_eq!(
            replace_at(&doc, &p("sections[0]"), json!({})),
            Err(PatchError::IndexOutOfBounds {
                path: "sections".into(),
                index: 0,
                len: 0
            })
        );
        assert_eq!(
            replace_at(&doc, &p("missing.child"), json!(1)),
            Err(PatchError::MissingField {
                path: "missing".into()
            })
        );
        assert!(matches!(
            replace_at(&doc, &p("title.inner"), json!(1)),
            Err(PatchError::NotAContainer { .. })
        ));
    }

    #[test]
    fn test_insert_and_remove() {
        let doc = json!({"sections": [{"type": "hero"}]});
        let doc = insert_at(&doc, &p("sections[1]"), json!({"type": "footer"})).unwrap();
        let doc = insert_at(&doc, &p("sections[0]"), json!({"type": "feature"})).unwrap();
        assert_eq!(
            doc["sections"],
            json!([{"type": "feature"}, {"type": "hero"}, {"type": "footer"}])
        );

        let doc = remove_at(&doc, &p("sections[1]")).unwrap();
        assert_eq!(doc["sections"], json!([{"type": "feature"}, {"type": "footer"}]));

        let doc = remove_at(&doc, &p("sections[0].type")).unwrap();
        assert_eq!(doc["sections"][0], json!({}));

        assert!(insert_at(&doc, &p("sections[9]"), json!(1)).is_err());
        assert_eq!(remove_at(&doc, &FieldPath::root()), Err(PatchError::Root));
    }
}
