//! Core data model shared by the provider, the schema layer and the fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current field values, keyed by field name.
///
/// Values stay untyped until they cross the schema boundary; the schema's
/// output is the only typed shape callers see.
pub type Values = serde_json::Map<String, Value>;

/// One message per failing field, derived from the last validation run.
pub type Errors = BTreeMap<String, String>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One segment of the location a validation issue points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Parse a single unescaped JSON Pointer token.
    ///
    /// Purely numeric tokens become indices.
    pub fn from_token(token: &str) -> Self {
        match token.parse::<usize>() {
            Ok(index) if !token.starts_with('+') => PathSegment::Index(index),
            _ => PathSegment::Key(token.to_string()),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Split a JSON Pointer (RFC 6901) into path segments.
///
/// The empty pointer addresses the root and yields no segments.
pub fn pointer_segments(pointer: &str) -> Vec<PathSegment> {
    let path = pointer.trim_start_matches('#');
    if path.is_empty() {
        return Vec::new();
    }
    path.trim_start_matches('/')
        .split('/')
        .map(|part| PathSegment::from_token(&part.replace("~1", "/").replace("~0", "~")))
        .collect()
}

/// A single schema failure: where it happened and what to tell the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Issue addressing a single top-level field.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        Self::new(vec![PathSegment::from(name)], message)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(f, "/{}: {}", path.join("/"), self.message)
    }
}
