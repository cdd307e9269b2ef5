//! Document representation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which shape a document currently has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Object,
    Array,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Object => "object",
            Mode::Array => "array",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single document owned by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    /// String-keyed mapping
    Object(Map<String, Value>),
    /// Ordered sequence
    Array(Vec<Value>),
}

impl Default for Document {
    fn default() -> Self {
        Document::Object(Map::new())
    }
}

impl Document {
    /// Wraps a JSON value; scalars are not documents
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Document::Object(map)),
            Value::Array(items) => Some(Document::Array(items)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Document::Object(map) => Value::Object(map.clone()),
            Document::Array(items) => Value::Array(items.clone()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Document::Object(map) => Value::Object(map),
            Document::Array(items) => Value::Array(items),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Document::Object(_) => Mode::Object,
            Document::Array(_) => Mode::Array,
        }
    }

    /// Empty document of the given mode
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Object => Document::Object(Map::new()),
            Mode::Array => Document::Array(Vec::new()),
        }
    }

    /// Empty document of the same mode
    pub fn emptied(&self) -> Self {
        Self::empty(self.mode())
    }

    pub fn len(&self) -> usize {
        match self {
            Document::Object(map) => map.len(),
            Document::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Document::Object(map) => Some(map),
            Document::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Document::Array(items) => Some(items),
            Document::Object(_) => None,
        }
    }
}

impl PartialEq<Value> for Document {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Document::Object(map), Value::Object(other)) => map == other,
            (Document::Array(items), Value::Array(other)) => items == other,
            _ => false,
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}
