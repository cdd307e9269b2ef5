//! Compiled validator for descriptors
//!
//! Validation semantics:
//! - All declared fields are present (fields tagged `any` may be absent)
//! - Declared fields match their tag
//! - Array elements all match the element type
//! - Undeclared fields are rejected, dropped or kept depending on `CheckMode`
//!
//! Every violation is collected; a check never stops at the first one.

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::{ValidationError, ValidationResult, Violation};
use super::types::{Descriptor, ElementType, ObjectShape, TypeTag};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// How undeclared object fields are treated by a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Undeclared fields are violations
    Strict,
    /// Undeclared fields are silently removed from the output
    Strip,
    /// Undeclared fields are copied to the output untouched
    PassThrough,
}

/// Checker compiled from a single descriptor.
///
/// The descriptor is owned so the two can never drift apart.
#[derive(Debug, Clone)]
pub struct Validator {
    descriptor: Descriptor,
    email: Regex,
}

impl Validator {
    /// Compiles a descriptor into a checker.
    pub fn compile(descriptor: Descriptor) -> Self {
        // The pattern is a literal; failure here is a programming error.
        let email = Regex::new(EMAIL_PATTERN).expect("email pattern compiles");
        Self { descriptor, email }
    }

    /// Returns the descriptor this validator was compiled from
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Checks `value`, returning the cleaned copy on success.
    ///
    /// In `Strict` and `PassThrough` modes the returned value equals the
    /// input; in `Strip` mode undeclared object fields are removed.
    pub fn check(&self, value: &Value, mode: CheckMode) -> ValidationResult<Value> {
        let mut violations = Vec::new();
        let cleaned = match &self.descriptor {
            Descriptor::Object { fields } => match value.as_object() {
                Some(obj) => Value::Object(self.check_object(obj, fields, mode, "", &mut violations)),
                None => {
                    violations.push(Violation::type_mismatch("$root", "object", json_type_name(value)));
                    Value::Null
                }
            },
            Descriptor::Array { element } => match value.as_array() {
                Some(items) => Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            self.check_element(item, element, mode, &format!("[{}]", i), &mut violations)
                        })
                        .collect(),
                ),
                None => {
                    violations.push(Violation::type_mismatch("$root", "array", json_type_name(value)));
                    Value::Null
                }
            },
        };

        if violations.is_empty() {
            Ok(cleaned)
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Checks a single array element against the element type.
    ///
    /// Fails with a mode-independent violation when the descriptor is not an
    /// array descriptor.
    pub fn check_element_value(&self, item: &Value, mode: CheckMode) -> ValidationResult<Value> {
        let mut violations = Vec::new();
        let cleaned = match &self.descriptor {
            Descriptor::Array { element } => self.check_element(item, element, mode, "[]", &mut violations),
            Descriptor::Object { .. } => {
                violations.push(Violation::type_mismatch("$root", "array descriptor", "object descriptor"));
                Value::Null
            }
        };

        if violations.is_empty() {
            Ok(cleaned)
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Keeps only the fields an object descriptor declares.
    ///
    /// Values are not checked. Array descriptors declare no top-level
    /// fields, so the map is returned unchanged.
    pub fn strip_undeclared(&self, mut fields: Map<String, Value>) -> Map<String, Value> {
        if let Descriptor::Object { fields: declared } = &self.descriptor {
            fields.retain(|key, _| declared.contains_key(key));
        }
        fields
    }

    fn check_object(
        &self,
        obj: &Map<String, Value>,
        fields: &ObjectShape,
        mode: CheckMode,
        path_prefix: &str,
        violations: &mut Vec<Violation>,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for (key, value) in obj {
            if fields.contains_key(key) {
                continue;
            }
            match mode {
                CheckMode::Strict => violations.push(Violation::extra_field(make_path(path_prefix, key))),
                CheckMode::Strip => {}
                CheckMode::PassThrough => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        for (field, tag) in fields {
            let field_path = make_path(path_prefix, field);
            match obj.get(field) {
                Some(value) => {
                    if self.matches_tag(value, *tag) {
                        out.insert(field.clone(), value.clone());
                    } else {
                        violations.push(Violation::type_mismatch(field_path, tag.type_name(), json_type_name(value)));
                    }
                }
                None if *tag == TypeTag::Any => {}
                None => violations.push(Violation::missing_field(field_path)),
            }
        }

        out
    }

    fn check_element(
        &self,
        item: &Value,
        element: &ElementType,
        mode: CheckMode,
        path: &str,
        violations: &mut Vec<Violation>,
    ) -> Value {
        match element {
            ElementType::Tag(tag) => {
                if !self.matches_tag(item, *tag) {
                    violations.push(Violation::type_mismatch(path, tag.type_name(), json_type_name(item)));
                }
                item.clone()
            }
            ElementType::Object(fields) => match item.as_object() {
                Some(obj) => Value::Object(self.check_object(obj, fields, mode, path, violations)),
                None => {
                    violations.push(Violation::type_mismatch(path, "object", json_type_name(item)));
                    item.clone()
                }
            },
        }
    }

    fn matches_tag(&self, value: &Value, tag: TypeTag) -> bool {
        match tag {
            TypeTag::String => value.is_string(),
            TypeTag::Number => value.is_number(),
            TypeTag::Boolean => value.is_boolean(),
            TypeTag::Email => value.as_str().map_or(false, |s| self.email.is_match(s)),
            TypeTag::Array => value.is_array(),
            TypeTag::Object => value.is_object(),
            TypeTag::Any => true,
        }
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
