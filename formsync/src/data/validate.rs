use std::fmt;

use serde_json::Value;

use crate::data::{
    path::FieldPath,
    schema::{FieldKind, FieldSchema, Schema},
};

/// JSON kind of a concrete value, used in wrong-kind reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(s)
    }
}

/// The rule a field broke.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A key listed in its parent's `required` is absent.
    MissingRequired,
    WrongKind {
        expected: FieldKind,
        actual: ValueKind,
    },
    NotInEnum {
        value: Value,
        allowed: Vec<Value>,
    },
    OutOfRange {
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    /// The value cannot be written in the current text format.
    Unserializable { reason: String },
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::MissingRequired => f.write_str("required field is missing"),
            Rule::WrongKind { expected, actual } => write!(f, "expected {expected}, found {actual}"),
            Rule::NotInEnum { value, allowed } => {
                let allowed: Vec<String> = allowed.iter().map(Value::to_string).collect();
                write!(f, "{value} is not one of {}", allowed.join(", "))
            }
            Rule::OutOfRange {
                value,
                minimum,
                maximum,
            } => {
                let lo = minimum.map_or("-inf".to_string(), |m| m.to_string());
                let hi = maximum.map_or("inf".to_string(), |m| m.to_string());
                write!(f, "{value} is outside [{lo}, {hi}]")
            }
            Rule::Unserializable { reason } => write!(f, "cannot be written as text: {reason}"),
        }
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: FieldPath,
    pub rule: Rule,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "document: {}", self.rule)
        } else {
            write!(f, "{}: {}", self.path, self.rule)
        }
    }
}

/// Every violation found in one value, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations attached to exactly `path`, for inline display next to a
    /// form field.
    pub fn for_path<'a>(&'a self, path: &'a FieldPath) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| &v.path == path)
    }

    pub fn push(&mut self, path: FieldPath, rule: Rule) {
        self.violations.push(Violation { path, rule });
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.violations {
            writeln!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Checks `value` against `schema` and collects every violation.
///
/// Never fails: partially invalid documents are an expected state while the
/// user is typing. Keys the schema does not mention are ignored.
pub fn validate(value: &Value, schema: &Schema) -> ValidationReport {
    let mut report = ValidationReport::default();
    check(value, &schema.root, FieldPath::root(), &mut report);
    report
}

fn check(value: &Value, field: &FieldSchema, path: FieldPath, report: &mut ValidationReport) {
    if value.is_null() && field.nullable {
        return;
    }

    match field.kind {
        FieldKind::Enum => {
            if !field.enum_values.contains(value) {
                report.push(
                    path,
                    Rule::NotInEnum {
                        value: value.clone(),
                        allowed: field.enum_values.clone(),
                    },
                );
            }
        }
        FieldKind::String => expect_kind(value.is_string(), field, value, path, report),
        FieldKind::Boolean => expect_kind(value.is_boolean(), field, value, path, report),
        FieldKind::Number | FieldKind::Integer => {
            let Some(n) = value.as_f64() else {
                report.push(path, wrong_kind(field, value));
                return;
            };
            if field.kind == FieldKind::Integer && n.fract() != 0.0 {
                report.push(path, wrong_kind(field, value));
                return;
            }
            let below = field.minimum.is_some_and(|m| n < m);
            let above = field.maximum.is_some_and(|m| n > m);
            if below || above {
                report.push(
                    path,
                    Rule::OutOfRange {
                        value: n,
                        minimum: field.minimum,
                        maximum: field.maximum,
                    },
                );
            }
        }
        FieldKind::Array => {
            let Some(items) = value.as_array() else {
                report.push(path, wrong_kind(field, value));
                return;
            };
            if let Some(item_schema) = &field.items {
                for (i, item) in items.iter().enumerate() {
                    check(item, item_schema, path.index(i), report);
                }
            }
        }
        FieldKind::Object => {
            let Some(map) = value.as_object() else {
                report.push(path, wrong_kind(field, value));
                return;
            };
            for (key, child) in &field.properties {
                match map.get(key) {
                    Some(v) => check(v, child, path.key(key.as_str()), report),
                    None if field.is_required(key) => {
                        report.push(path.key(key.as_str()), Rule::MissingRequired)
                    }
                    None => {}
                }
            }
            // Required keys without a property descriptor.
            for key in &field.required {
                if field.property(key).is_none() && !map.contains_key(key) {
                    report.push(path.key(key.as_str()), Rule::MissingRequired);
                }
            }
        }
    }
}

fn expect_kind(
    ok: bool,
    field: &FieldSchema,
    value: &Value,
    path: FieldPath,
    report: &mut ValidationReport,
) {
    if !ok {
        report.push(path, wrong_kind(field, value));
    }
}

fn wrong_kind(field: &FieldSchema, value: &Value) -> Rule {
    Rule::WrongKind {
        expected: field.kind,
        actual: ValueKind::of(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        let item = FieldSchema::object()
            .with_property("type", FieldSchema::enumeration(["hero", "footer"]))
            .with_property("headline", FieldSchema::string())
            .with_property("strength", FieldSchema::number().with_range(Some(0.0), Some(1.0)))
            .with_property("count", FieldSchema::integer())
            .with_required(["type"]);
        Schema::new(
            FieldSchema::object()
                .with_property("title", FieldSchema::string())
                .with_property("sections", FieldSchema::array(item))
                .with_required(["title", "sections"]),
        )
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "title": "A",
            "sections": [{"type": "hero", "headline": "Hi", "strength": 0.5, "extra": [1, 2]}]
        });
        assert!(validate(&doc, &schema()).is_valid());
    }

    #[test]
    fn test_missing_required_names_field() {
        let report = validate(&json!({"sections": []}), &schema());
        assert_eq!(report.len(), 1);
        let v = &report.violations()[0];
        assert_eq!(v.path.to_string(), "title");
        assert_eq!(v.rule, Rule::MissingRequired);
        assert_eq!(v.to_string(), "title: required field is missing");
    }

    #[test]
    fn test_collects_every_violation() {
        let doc = json!({
            "title": 3,
            "sections": [
                {"type": "banner", "strength": 1.5},
                {"headline": false, "count": 2.5},
                "not an object"
            ]
        });
        let report = validate(&doc, &schema());
        let found: Vec<String> = report.iter().map(|v| v.path.to_string()).collect();
        assert_eq!(
            found,
            [
                "title",
                "sections[0].type",
                "sections[0].strength",
                "sections[1].type",
                "sections[1].headline",
                "sections[1].count",
                "sections[2]",
            ]
        );
        assert!(matches!(
            report.violations()[0].rule,
            Rule::WrongKind {
                expected: FieldKind::String,
                actual: ValueKind::Number
            }
        ));
        let strength = "sections[0].strength".parse().unwrap();
        assert_eq!(report.for_path(&strength).count(), 1);
    }

    #[test]
    fn test_nullable_and_root_kind() {
        let schema = Schema::new(
            FieldSchema::object().with_property("note", FieldSchema::string().nullable()),
        );
        assert!(validate(&json!({"note": null}), &schema).is_valid());

        let report = validate(&json!([1]), &schema);
        assert_eq!(report.len(), 1);
        assert!(report.violations()[0].to_string().starts_with("document:"));
    }
}
