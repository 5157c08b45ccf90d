use std::{fmt, str::FromStr};

use serde_json::Value;
use thiserror::Error;

/// One step from a container value to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

/// Location of a field inside a structured value, starting at the root.
///
/// Displayed as `sections[0].headline`; the root path displays as an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

/// Error returned when a textual field path is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field path {input:?} at byte {offset}: {reason}")]
pub struct PathParseError {
    /// The rejected input.
    pub input: String,
    /// Byte offset of the problem.
    pub offset: usize,
    /// What was wrong.
    pub reason: &'static str,
}

impl FieldPath {
    /// The empty path addressing the whole document.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this path addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a child path one key deeper.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Key(key.into()));
        next
    }

    /// Returns a child path one index deeper.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Index(index));
        next
    }

    /// Splits off the last segment.
    pub fn split_last(&self) -> Option<(FieldPath, &PathSegment)> {
        let (last, parent) = self.0.split_last()?;
        Some((FieldPath(parent.to_vec()), last))
    }

    /// Renders the path as an RFC 6901 JSON pointer.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for seg in &self.0 {
            out.push('/');
            match seg {
                PathSegment::Key(k) => out.push_str(&k.replace('~', "~0").replace('/', "~1")),
                PathSegment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }

    /// Resolves the path against a value.
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(value, |cur, seg| match (seg, cur) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k),
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i),
            _ => None,
        })
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                PathSegment::Key(k) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(k)?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |offset, reason| PathParseError {
            input: s.to_string(),
            offset,
            reason,
        };

        let mut segments = Vec::new();
        let bytes = s.as_bytes();
        let mut pos = 0;
        let mut expect_key = true;

        while pos < bytes.len() {
            match bytes[pos] {
                b'[' => {
                    let close = s[pos..]
                        .find(']')
                        .map(|off| pos + off)
                        .ok_or_else(|| err(pos, "unclosed index bracket"))?;
                    let index = s[pos + 1..close]
                        .parse::<usize>()
                        .map_err(|_| err(pos + 1, "index is not a non-negative integer"))?;
                    segments.push(PathSegment::Index(index));
                    pos = close + 1;
                    expect_key = false;
                }
                b'.' => {
                    if segments.is_empty() || expect_key {
                        return Err(err(pos, "empty key"));
                    }
                    pos += 1;
                    expect_key = true;
                    if pos == bytes.len() {
                        return Err(err(pos, "empty key"));
                    }
                }
                _ => {
                    if !expect_key {
                        return Err(err(pos, "expected '.' or '[' after index"));
                    }
                    let end = s[pos..]
                        .find(['.', '['])
                        .map(|off| pos + off)
                        .unwrap_or(s.len());
                    segments.push(PathSegment::Key(s[pos..end].to_string()));
                    pos = end;
                    expect_key = false;
                }
            }
        }

        Ok(Self(segments))
    }
}
