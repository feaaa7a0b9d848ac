use crate::RuleId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The closed set of evaluation outcomes.
///
/// Precedence is fixed: `Disabled` dominates `Exempted`, which dominates
/// whatever the rule kind itself reports (`Conforming`, `NonConforming`,
/// `NotApplicable`). `Error` captures an evaluation failure; it is produced
/// by the engine, never by rule kinds directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Conforming,
    NonConforming,
    NotApplicable,
    Disabled,
    Exempted,
    Error,
}

impl Outcome {
    /// True for outcomes that represent a problem worth surfacing
    /// (a violation or a broken evaluation), as opposed to benign states.
    pub fn is_flagged(self) -> bool {
        matches!(self, Outcome::NonConforming | Outcome::Error)
    }
}

/// Immutable result of evaluating one rule against one device.
///
/// The core produces exactly one of these per (rule, device) evaluation;
/// persistence of results is the reporting layer's concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckResult {
    pub policy: String,
    pub rule: String,
    pub rule_id: RuleId,
    pub device: String,
    pub outcome: Outcome,

    /// Diagnostic text: which line violated the rule, why evaluation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Per-outcome tallies for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeCounts {
    pub conforming: u32,
    pub non_conforming: u32,
    pub not_applicable: u32,
    pub disabled: u32,
    pub exempted: u32,
    pub error: u32,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Conforming => self.conforming += 1,
            Outcome::NonConforming => self.non_conforming += 1,
            Outcome::NotApplicable => self.not_applicable += 1,
            Outcome::Disabled => self.disabled += 1,
            Outcome::Exempted => self.exempted += 1,
            Outcome::Error => self.error += 1,
        }
    }

    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            counts.record(result.outcome);
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.conforming
            + self.non_conforming
            + self.not_applicable
            + self.disabled
            + self.exempted
            + self.error
    }
}
