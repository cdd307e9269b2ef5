//! Descriptor inference from an example value
//!
//! Object fields are typed shallowly: nested containers become the generic
//! `array` / `object` tags. Array elements are typed from the first element,
//! and an object element gets its own (shallow) shape.

use serde_json::{Map, Value};

use super::types::{Descriptor, ElementType, ObjectShape, TypeTag};

/// Tag of a single value when it appears as an object field.
pub fn primitive_tag(value: &Value) -> TypeTag {
    match value {
        Value::String(s) if s.contains('@') => TypeTag::Email,
        Value::String(_) => TypeTag::String,
        Value::Number(_) => TypeTag::Number,
        Value::Bool(_) => TypeTag::Boolean,
        _ => TypeTag::Any,
    }
}

fn field_tag(value: &Value) -> TypeTag {
    match value {
        Value::Array(_) => TypeTag::Array,
        Value::Object(_) => TypeTag::Object,
        other => primitive_tag(other),
    }
}

/// Shallow shape of an object: one tag per immediate field.
pub fn infer_shape(obj: &Map<String, Value>) -> ObjectShape {
    obj.iter().map(|(k, v)| (k.clone(), field_tag(v))).collect()
}

/// Element type of an array, decided by its first element.
pub fn infer_element(items: &[Value]) -> ElementType {
    match items.first() {
        None => ElementType::Tag(TypeTag::Any),
        Some(Value::Object(obj)) => ElementType::Object(infer_shape(obj)),
        Some(other) => ElementType::Tag(primitive_tag(other)),
    }
}

/// Infers a descriptor from an example document.
///
/// Returns `None` for scalars, which are not valid documents.
pub fn infer_descriptor(example: &Value) -> Option<Descriptor> {
    match example {
        Value::Object(obj) => Some(Descriptor::object(infer_shape(obj))),
        Value::Array(items) => Some(Descriptor::array(infer_element(items))),
        _ => None,
    }
}
