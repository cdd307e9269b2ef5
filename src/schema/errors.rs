//! Validation error types
//!
//! A failed check reports every violated path, not just the first one.

use std::fmt;

use thiserror::Error;

/// One violated field or element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path to the value (e.g. "email", "[2].name", "$root")
    pub path: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value kind found
    pub actual: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(path: impl Into<String>) -> Self {
        Self::new(path, "field to be present", "missing")
    }

    pub fn extra_field(path: impl Into<String>) -> Self {
        Self::new(path, "no undeclared fields", "extra field present")
    }

    pub fn type_mismatch(path: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(path, expected, actual)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': expected {}, got {}", self.path, self.expected, self.actual)
    }
}

/// Structured validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Builds the error and its summary message from the collected violations.
    pub fn new(violations: Vec<Violation>) -> Self {
        let listed: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        let message = format!(
            "validation failed with {} violation(s): {}",
            violations.len(),
            listed.join("; ")
        );
        Self { message, violations }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true if any violation is reported at `path`
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
