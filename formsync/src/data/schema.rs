use std::fmt;

use schemars::JsonSchema;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::data::path::{FieldPath, PathSegment};

/// Errors raised while reading a JSON Schema into a [`Schema`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The node declares no usable `type` and no shape to infer one from.
    #[error("missing type at {path:?}")]
    MissingType { path: String },
    /// The node uses a type or combinator outside the supported subset.
    #[error("unsupported schema at {path:?}: {detail}")]
    Unsupported { path: String, detail: String },
    /// A `$ref` does not point into `$defs` or `definitions` of the root.
    #[error("unresolved reference {reference:?} at {path:?}")]
    UnresolvedRef { path: String, reference: String },
    /// A `$ref` loops back into one of its own ancestors.
    #[error("cyclic reference {reference:?} at {path:?}")]
    CyclicRef { path: String, reference: String },
    /// A keyword holds a value of the wrong JSON type.
    #[error("invalid {keyword:?} at {path:?}")]
    InvalidKeyword { path: String, keyword: &'static str },
}

/// Kind of a field as seen by the structured view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    /// One of a fixed list of values.
    Enum,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
            FieldKind::Enum => "enum",
        };
        f.write_str(s)
    }
}

/// Descriptor of a single field and, for containers, its children.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub kind: FieldKind,
    /// Form label.
    pub title: Option<String>,
    pub description: Option<String>,
    /// Whether `null` is accepted in place of a value of `kind`.
    pub nullable: bool,
    /// Keys an object must contain.
    pub required: Vec<String>,
    /// Allowed values of an enum field.
    pub enum_values: Vec<Value>,
    /// Inclusive lower bound of a numeric field.
    pub minimum: Option<f64>,
    /// Inclusive upper bound of a numeric field.
    pub maximum: Option<f64>,
    /// Object children in declaration order.
    pub properties: Vec<(String, FieldSchema)>,
    /// Descriptor shared by every array element; `None` accepts anything.
    pub items: Option<Box<FieldSchema>>,
    pub default: Option<Value>,
}

impl FieldSchema {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            title: None,
            description: None,
            nullable: false,
            required: Vec::new(),
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            properties: Vec::new(),
            items: None,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn object() -> Self {
        Self::new(FieldKind::Object)
    }

    /// Array whose elements follow `items`.
    pub fn array(items: FieldSchema) -> Self {
        Self::new(FieldKind::Array).with_items(items)
    }

    /// Enum over the given values.
    pub fn enumeration<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut s = Self::new(FieldKind::Enum);
        s.enum_values = values.into_iter().map(Into::into).collect();
        s
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, field: FieldSchema) -> Self {
        self.properties.push((key.into(), field));
        self
    }

    pub fn with_required<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_items(mut self, items: FieldSchema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Looks up an object child by key.
    pub fn property(&self, key: &str) -> Option<&FieldSchema> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, f)| f)
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key)
    }

    /// Builds a fresh value for a newly added field.
    ///
    /// Objects only receive their required children so that optional fields
    /// stay absent until the user fills them in.
    pub fn skeleton(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        match self.kind {
            FieldKind::String => Value::String(String::new()),
            FieldKind::Number | FieldKind::Integer => {
                let mut start = 0.0_f64;
                if let Some(min) = self.minimum {
                    start = start.max(min);
                }
                if let Some(max) = self.maximum {
                    start = start.min(max);
                }
                if self.kind == FieldKind::Integer {
                    // Stay within the range when it holds an integer at all.
                    start = start.ceil();
                    if let Some(max) = self.maximum
                        && start > max
                    {
                        start = max.floor();
                    }
                }
                if start.fract() == 0.0 {
                    Value::from(start as i64)
                } else {
                    Value::from(start)
                }
            }
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::Enum => self.enum_values.first().cloned().unwrap_or(Value::Null),
            FieldKind::Array => Value::Array(Vec::new()),
            FieldKind::Object => {
                let mut map = Map::new();
                for (key, field) in &self.properties {
                    if self.is_required(key) {
                        map.insert(key.clone(), field.skeleton());
                    }
                }
                Value::Object(map)
            }
        }
    }
}

/// Static description of a document's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub title: Option<String>,
    pub root: FieldSchema,
}

impl Schema {
    pub fn new(root: FieldSchema) -> Self {
        Self {
            title: root.title.clone(),
            root,
        }
    }

    /// Derives the schema of a Rust type through `schemars`.
    pub fn for_type<T: JsonSchema>() -> Result<Self, SchemaError> {
        let generated = schemars::schema_for!(T);
        let value = serde_json::to_value(&generated).map_err(|e| SchemaError::Unsupported {
            path: String::new(),
            detail: e.to_string(),
        })?;
        Self::try_from(&value)
    }

    /// Finds the descriptor governing the value at `path`.
    pub fn field(&self, path: &FieldPath) -> Option<&FieldSchema> {
        path.segments()
            .iter()
            .try_fold(&self.root, |cur, seg| match seg {
                PathSegment::Key(k) if cur.kind == FieldKind::Object => cur.property(k),
                PathSegment::Index(_) if cur.kind == FieldKind::Array => cur.items.as_deref(),
                _ => None,
            })
    }
}

impl TryFrom<&Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let mut reader = SchemaReader {
            root: value,
            ref_stack: Vec::new(),
        };
        let root = reader.read(value, "")?;
        Ok(Schema {
            title: root.title.clone(),
            root,
        })
    }
}

struct SchemaReader<'a> {
    root: &'a Value,
    ref_stack: Vec<String>,
}

impl<'a> SchemaReader<'a> {
    fn read(&mut self, node: &'a Value, path: &str) -> Result<FieldSchema, SchemaError> {
        let Some(obj) = node.as_object() else {
            // `true` accepts anything; model it as a nullable string field.
            if node.as_bool() == Some(true) {
                return Ok(FieldSchema::string().nullable());
            }
            return Err(SchemaError::Unsupported {
                path: path.to_string(),
                detail: format!("schema node is {node}"),
            });
        };

        if let Some(reference) = obj.get("$ref") {
            let reference = reference.as_str().ok_or(SchemaError::InvalidKeyword {
                path: path.to_string(),
                keyword: "$ref",
            })?;
            let mut field = self.read_ref(reference, path)?;
            apply_annotations(&mut field, obj);
            return Ok(field);
        }

        if let Some(all_of) = obj.get("allOf") {
            let branches = all_of.as_array().ok_or(SchemaError::InvalidKeyword {
                path: path.to_string(),
                keyword: "allOf",
            })?;
            let [only] = branches.as_slice() else {
                return Err(SchemaError::Unsupported {
                    path: path.to_string(),
                    detail: "allOf with more than one branch".into(),
                });
            };
            let mut field = self.read(only, path)?;
            apply_annotations(&mut field, obj);
            return Ok(field);
        }

        for keyword in ["anyOf", "oneOf"] {
            if let Some(branches) = obj.get(keyword) {
                let mut field = self.read_alternatives(branches, keyword, path)?;
                apply_annotations(&mut field, obj);
                return Ok(field);
            }
        }

        let (declared, mut nullable) = read_type(obj, path)?;

        if let Some(values) = obj.get("enum") {
            let values = values.as_array().ok_or(SchemaError::InvalidKeyword {
                path: path.to_string(),
                keyword: "enum",
            })?;
            let mut field = FieldSchema::new(FieldKind::Enum);
            for v in values {
                if v.is_null() {
                    nullable = true;
                } else {
                    field.enum_values.push(v.clone());
                }
            }
            field.nullable = nullable;
            apply_annotations(&mut field, obj);
            return Ok(field);
        }

        if let Some(constant) = obj.get("const") {
            let mut field = FieldSchema::enumeration([constant.clone()]);
            field.nullable = nullable;
            apply_annotations(&mut field, obj);
            return Ok(field);
        }

        let kind = match declared {
            Some(kind) => kind,
            None if obj.contains_key("properties") => FieldKind::Object,
            None if obj.contains_key("items") => FieldKind::Array,
            None => {
                return Err(SchemaError::MissingType {
                    path: path.to_string(),
                });
            }
        };

        let mut field = FieldSchema::new(kind);
        field.nullable = nullable;
        apply_annotations(&mut field, obj);

        match kind {
            FieldKind::Object => {
                if let Some(props) = obj.get("properties") {
                    let props = props.as_object().ok_or(SchemaError::InvalidKeyword {
                        path: path.to_string(),
                        keyword: "properties",
                    })?;
                    for (key, child) in props {
                        let child_path = join(path, key);
                        field.properties.push((key.clone(), self.read(child, &child_path)?));
                    }
                }
                if let Some(required) = obj.get("required") {
                    let invalid = || SchemaError::InvalidKeyword {
                        path: path.to_string(),
                        keyword: "required",
                    };
                    for key in required.as_array().ok_or_else(invalid)? {
                        field
                            .required
                            .push(key.as_str().ok_or_else(invalid)?.to_string());
                    }
                }
            }
            FieldKind::Array => {
                if let Some(items) = obj.get("items") {
                    let item_path = format!("{path}[]");
                    field.items = Some(Box::new(self.read(items, &item_path)?));
                }
            }
            FieldKind::Number | FieldKind::Integer => {
                field.minimum = read_bound(obj, "minimum", path)?;
                field.maximum = read_bound(obj, "maximum", path)?;
            }
            _ => {}
        }

        Ok(field)
    }

    fn read_ref(&mut self, reference: &str, path: &str) -> Result<FieldSchema, SchemaError> {
        let root = self.root;
        let target = reference
            .strip_prefix('#')
            .and_then(|pointer| root.pointer(pointer))
            .ok_or_else(|| SchemaError::UnresolvedRef {
                path: path.to_string(),
                reference: reference.to_string(),
            })?;

        if self.ref_stack.iter().any(|r| r == reference) {
            return Err(SchemaError::CyclicRef {
                path: path.to_string(),
                reference: reference.to_string(),
            });
        }

        self.ref_stack.push(reference.to_string());
        let result = self.read(target, path);
        self.ref_stack.pop();
        result
    }

    /// Reads `anyOf` / `oneOf`: either a list of constants or one schema
    /// alongside a `null` branch.
    fn read_alternatives(
        &mut self,
        branches: &'a Value,
        keyword: &'static str,
        path: &str,
    ) -> Result<FieldSchema, SchemaError> {
        let branches = branches.as_array().ok_or(SchemaError::InvalidKeyword {
            path: path.to_string(),
            keyword,
        })?;

        let is_null = |b: &Value| b.get("type").and_then(Value::as_str) == Some("null");
        let nullable = branches.iter().any(is_null);
        let rest: Vec<&'a Value> = branches.iter().filter(|b| !is_null(*b)).collect();

        let constants: Option<Vec<Value>> = rest
            .iter()
            .map(|b| {
                b.get("const").cloned().or_else(|| match b.get("enum") {
                    Some(Value::Array(values)) if values.len() == 1 => Some(values[0].clone()),
                    _ => None,
                })
            })
            .collect();
        if let Some(values) = constants
            && !values.is_empty()
        {
            let mut field = FieldSchema::enumeration(values);
            field.nullable = nullable;
            return Ok(field);
        }

        let [only] = rest.as_slice() else {
            return Err(SchemaError::Unsupported {
                path: path.to_string(),
                detail: format!("{keyword} with {} non-null branches", rest.len()),
            });
        };
        let mut field = self.read(*only, path)?;
        field.nullable |= nullable;
        Ok(field)
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn read_type(obj: &Map<String, Value>, path: &str) -> Result<(Option<FieldKind>, bool), SchemaError> {
    let names: Vec<&str> = match obj.get("type") {
        None => return Ok((None, false)),
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
        Some(_) => {
            return Err(SchemaError::InvalidKeyword {
                path: path.to_string(),
                keyword: "type",
            });
        }
    };

    let nullable = names.contains(&"null");
    let concrete: Vec<&str> = names.into_iter().filter(|n| *n != "null").collect();
    let kind = match concrete.as_slice() {
        [] => None,
        ["string"] => Some(FieldKind::String),
        ["number"] => Some(FieldKind::Number),
        ["integer"] => Some(FieldKind::Integer),
        ["boolean"] => Some(FieldKind::Boolean),
        ["object"] => Some(FieldKind::Object),
        ["array"] => Some(FieldKind::Array),
        other => {
            return Err(SchemaError::Unsupported {
                path: path.to_string(),
                detail: format!("type {other:?}"),
            });
        }
    };
    Ok((kind, nullable))
}

fn read_bound(
    obj: &Map<String, Value>,
    keyword: &'static str,
    path: &str,
) -> Result<Option<f64>, SchemaError> {
    match obj.get(keyword) {
        None => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or(SchemaError::InvalidKeyword {
            path: path.to_string(),
            keyword,
        }),
    }
}

fn apply_annotations(field: &mut FieldSchema, obj: &Map<String, Value>) {
    if let Some(title) = obj.get("title").and_then(Value::as_str) {
        field.title = Some(title.to_string());
    }
    if let Some(description) = obj.get("description").and_then(Value::as_str) {
        field.description = Some(description.to_string());
    }
    if let Some(default) = obj.get("default") {
        field.default = Some(default.clone());
    }
}
