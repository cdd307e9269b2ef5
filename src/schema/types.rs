//! Descriptor type definitions
//!
//! Supported tags:
//! - string: any string
//! - number: any JSON number
//! - boolean: true / false
//! - email: string shaped like an email address
//! - array: any array (elements unconstrained)
//! - object: any JSON object (values unconstrained)
//! - any: no constraint

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type tag attached to a single field or array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// UTF-8 string
    String,
    /// Integer or floating point number
    Number,
    /// Boolean
    Boolean,
    /// String matching an email address pattern
    Email,
    /// Array of anything
    Array,
    /// Object of anything
    Object,
    /// Unconstrained
    Any,
}

impl TypeTag {
    /// Returns the tag name used in descriptors and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Email => "email",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Any => "any",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Field name to tag mapping of an object shape.
pub type ObjectShape = BTreeMap<String, TypeTag>;

/// Element type of an array descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementType {
    /// Every element matches a single tag
    Tag(TypeTag),
    /// Every element is an object with this shape
    Object(ObjectShape),
}

impl ElementType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementType::Tag(tag) => tag.type_name(),
            ElementType::Object(_) => "object",
        }
    }
}

/// Structural type of a whole document.
///
/// Built once and replaced wholesale; never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Descriptor {
    /// Document is an object with these declared fields
    Object {
        /// Declared fields
        fields: ObjectShape,
    },
    /// Document is an array of homogeneous elements
    Array {
        /// Element type
        element: ElementType,
    },
}

impl Descriptor {
    /// Create an object descriptor
    pub fn object(fields: ObjectShape) -> Self {
        Descriptor::Object { fields }
    }

    /// Create an array descriptor
    pub fn array(element: ElementType) -> Self {
        Descriptor::Array { element }
    }

    /// Returns "object" or "array"
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::Object { .. } => "object",
            Descriptor::Array { .. } => "array",
        }
    }
}

/// Convenience for building shapes in code and tests.
pub fn shape<I, K>(fields: I) -> ObjectShape
where
    I: IntoIterator<Item = (K, TypeTag)>,
    K: Into<String>,
{
    fields.into_iter().map(|(k, t)| (k.into(), t)).collect()
}
