//! Stable identifiers for rules and rule kinds.
//!
//! A kind tag is a short lowercase discriminator; it selects the evaluator
//! registered for the rule and is part of rule equality.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Rule kinds
pub const KIND_TEXT: &str = "text";
pub const KIND_JAVASCRIPT: &str = "javascript";
pub const KIND_PYTHON: &str = "python";

/// Stable numeric rule identity.
///
/// Assigned by the persistence layer when policies are loaded, never by the
/// evaluation core. Equality and hashing of rules derive from this id, so it
/// must stay stable for the lifetime of the loaded document.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RuleId(u64);

impl RuleId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
