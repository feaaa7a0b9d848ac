//! Rule kind implementations and the contract they satisfy.
//!
//! A kind owns the conformance logic for one rule flavor. The precedence
//! decisions (disabled, exempted) and failure capture live in the engine;
//! a kind only ever reports conformance, non-conformance, applicability,
//! or a `RuleError`.

use crate::context::EvalContext;
use crate::model::{DeviceModel, Rule};
use thiserror::Error;

mod script;
mod text;

pub use script::{SandboxError, ScriptKind, ScriptLanguage, ScriptSandbox};
pub use text::TextKind;

/// What a kind can say about an enabled, non-exempted rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conformance {
    Conforming,
    NonConforming,
    NotApplicable,
}

/// A kind's verdict plus optional explanatory text (which line violated
/// the rule, why the rule does not apply).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub conformance: Conformance,
    pub comment: Option<String>,
}

impl Evaluation {
    pub fn conforming(comment: impl Into<String>) -> Self {
        Self {
            conformance: Conformance::Conforming,
            comment: Some(comment.into()),
        }
    }

    pub fn non_conforming(comment: impl Into<String>) -> Self {
        Self {
            conformance: Conformance::NonConforming,
            comment: Some(comment.into()),
        }
    }

    pub fn not_applicable(comment: impl Into<String>) -> Self {
        Self {
            conformance: Conformance::NotApplicable,
            comment: Some(comment.into()),
        }
    }
}

/// Failure raised at the rule-kind boundary.
///
/// The engine maps every variant to an `error` outcome; nothing in here
/// may abort a run.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The stored definition itself is invalid (bad pattern, script that
    /// does not compile). `validate` exists to catch these before any
    /// device is evaluated.
    #[error("invalid rule definition: {0}")]
    Definition(String),

    /// The rule needs a device attribute the snapshot does not carry.
    #[error("device attribute '{0}' is not available")]
    MissingAttribute(String),

    #[error("script failed: {0}")]
    Script(#[from] SandboxError),
}

/// One rule flavor's evaluator.
///
/// Implementations must be deterministic: same rule definition and device
/// snapshot, same result. The evaluation instant comes from `ctx.now`; no
/// clock or network reads inside kind logic.
pub trait RuleKind: Send + Sync {
    /// The kind tag this evaluator serves; must match
    /// `RuleDetail::kind_tag` for the rules it accepts.
    fn tag(&self) -> &'static str;

    /// Device-independent validation of the stored definition, so
    /// authoring errors surface before any device is touched.
    fn validate(&self, rule: &Rule) -> Result<(), RuleError>;

    /// Conformance logic for an enabled, non-exempted rule.
    fn evaluate(
        &self,
        rule: &Rule,
        device: &DeviceModel,
        ctx: &mut EvalContext<'_>,
    ) -> Result<Evaluation, RuleError>;
}
