//! Advisory diff between two descriptors
//!
//! Computed when a descriptor is replaced administratively. The diff never
//! blocks the replacement; it is returned to the caller and logged.

use serde::Serialize;

use super::types::{Descriptor, ElementType, ObjectShape};

/// A field whose tag changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub from: String,
    pub to: String,
}

/// Structured set of changes between two descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    /// Fields present only in the new descriptor
    pub added: Vec<String>,
    /// Fields present only in the prior descriptor
    pub removed: Vec<String>,
    /// Fields present in both with different tags
    pub changed: Vec<FieldChange>,
}

impl SchemaDiff {
    /// Computes the changes going from `prior` to `next`.
    pub fn between(prior: &Descriptor, next: &Descriptor) -> Self {
        let mut diff = SchemaDiff::default();

        match (prior, next) {
            (Descriptor::Object { fields: a }, Descriptor::Object { fields: b }) => {
                diff.compare_shapes("", a, b);
            }
            (Descriptor::Array { element: a }, Descriptor::Array { element: b }) => match (a, b) {
                (ElementType::Object(a), ElementType::Object(b)) => diff.compare_shapes("[].", a, b),
                (a, b) if a != b => diff.change("[]", a.type_name(), b.type_name()),
                _ => {}
            },
            (Descriptor::Object { fields }, Descriptor::Array { .. }) => {
                diff.change("$root", prior.kind(), next.kind());
                diff.removed.extend(fields.keys().cloned());
            }
            (Descriptor::Array { .. }, Descriptor::Object { fields }) => {
                diff.change("$root", prior.kind(), next.kind());
                diff.added.extend(fields.keys().cloned());
            }
        }

        diff
    }

    /// Returns true when the descriptors are structurally identical
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn compare_shapes(&mut self, prefix: &str, prior: &ObjectShape, next: &ObjectShape) {
        for (field, tag) in next {
            match prior.get(field) {
                None => self.added.push(format!("{}{}", prefix, field)),
                Some(old) if old != tag => {
                    self.change(&format!("{}{}", prefix, field), old.type_name(), tag.type_name())
                }
                Some(_) => {}
            }
        }
        for field in prior.keys() {
            if !next.contains_key(field) {
                self.removed.push(format!("{}{}", prefix, field));
            }
        }
    }

    fn change(&mut self, field: &str, from: &str, to: &str) {
        self.changed.push(FieldChange {
            field: field.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }
}
