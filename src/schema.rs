use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The subset of BSON type names a validator can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BsonType {
    Object,
    String,
    Int,
    Double,
    Null,
}

impl BsonType {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            BsonType::Object => value.is_object(),
            BsonType::String => value.is_string(),
            // BSON `int` is 32-bit; wider integers would land as `long`.
            BsonType::Int => value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
            BsonType::Double => value.is_f64(),
            BsonType::Null => value.is_null(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BsonType::Object => "object",
            BsonType::String => "string",
            BsonType::Int => "int",
            BsonType::Double => "double",
            BsonType::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    One(BsonType),
    AnyOf(Vec<BsonType>),
}

impl TypeSpec {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeSpec::One(t) => t.matches(value),
            TypeSpec::AnyOf(types) => types.iter().any(|t| t.matches(value)),
        }
    }

    fn describe(&self) -> String {
        match self {
            TypeSpec::One(t) => t.name().to_string(),
            TypeSpec::AnyOf(types) => types
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "bsonType")]
    pub bson_type: TypeSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaNode>,
}

impl SchemaNode {
    pub fn of(bson_type: BsonType) -> Self {
        Self {
            bson_type: TypeSpec::One(bson_type),
            required: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// `bson_type` or `null`.
    pub fn nullable(bson_type: BsonType) -> Self {
        Self {
            bson_type: TypeSpec::AnyOf(vec![bson_type, BsonType::Null]),
            required: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn object() -> Self {
        Self::of(BsonType::Object)
    }

    pub fn require(mut self, fields: &[&str]) -> Self {
        self.required
            .extend(fields.iter().map(|field| field.to_string()));
        self
    }

    pub fn property(mut self, name: &str, node: SchemaNode) -> Self {
        self.properties.insert(name.to_string(), node);
        self
    }

    fn check(&self, value: &Value, path: &str, out: &mut Vec<Violation>) {
        if !self.bson_type.accepts(value) {
            out.push(Violation {
                path: display_path(path),
                message: format!(
                    "expected {}, found {}",
                    self.bson_type.describe(),
                    value_kind(value)
                ),
            });
            return;
        }
        let Some(map) = value.as_object() else {
            return;
        };
        for field in &self.required {
            if !map.contains_key(field) {
                out.push(Violation {
                    path: join_path(path, field),
                    message: "missing required field".to_string(),
                });
            }
        }
        for (key, node) in &self.properties {
            if let Some(child) = map.get(key) {
                node.check(child, &join_path(path, key), out);
            }
        }
    }
}

/// A collection validator, serialized as `{"$jsonSchema": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    #[serde(rename = "$jsonSchema")]
    pub schema: SchemaNode,
}

impl Validator {
    pub fn new(schema: SchemaNode) -> Self {
        Self { schema }
    }

    pub fn validate(&self, document: &Value) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        self.schema.check(document, "", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(document)".to_string()
    } else {
        path.to_string()
    }
}
