//! Schema subsystem
//!
//! Descriptors describe the structural shape of one document. They are
//! inferred from the first write, compiled into a `Validator`, and replaced
//! wholesale (with an advisory diff) by administrative updates.
//!
//! # Design Principles
//!
//! - A descriptor and its validator are always built together
//! - Object fields are inferred shallowly, array elements from the first element
//! - Undeclared-field handling is chosen per check, not per compilation
//! - Validation is deterministic and reports every violation

mod diff;
mod errors;
mod infer;
mod types;
mod validator;

pub use diff::{FieldChange, SchemaDiff};
pub use errors::{ValidationError, ValidationResult, Violation};
pub use infer::{infer_descriptor, infer_element, infer_shape, primitive_tag};
pub use types::{shape, Descriptor, ElementType, ObjectShape, TypeTag};
pub use validator::{CheckMode, Validator};

pub(crate) use validator::json_type_name;
