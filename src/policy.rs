//! Operating-mode policy of a store
//!
//! `read_only` blocks every document mutation. `auto_strip` switches object
//! writes from pass-through checking to stripping of undeclared fields; it
//! never installs a descriptor by itself.

use serde::{Deserialize, Serialize};

/// Persisted store options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Drop undeclared fields instead of keeping them
    #[serde(default)]
    pub auto_strip: bool,
    /// Reject all document mutations
    #[serde(default)]
    pub read_only: bool,
}

/// Partial update of a `Policy`; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_strip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl PolicyPatch {
    pub fn auto_strip(enabled: bool) -> Self {
        Self {
            auto_strip: Some(enabled),
            ..Self::default()
        }
    }

    pub fn read_only(enabled: bool) -> Self {
        Self {
            read_only: Some(enabled),
            ..Self::default()
        }
    }
}

impl Policy {
    /// Returns the policy with `patch` merged in
    pub fn merged(self, patch: PolicyPatch) -> Self {
        Self {
            auto_strip: patch.auto_strip.unwrap_or(self.auto_strip),
            read_only: patch.read_only.unwrap_or(self.read_only),
        }
    }
}
