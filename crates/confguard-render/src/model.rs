use confguard_types::{ConfguardReport, Outcome, Verdict};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableOutcome {
    Conforming,
    NonConforming,
    NotApplicable,
    Disabled,
    Exempted,
    Error,
}

impl RenderableOutcome {
    pub fn is_flagged(self) -> bool {
        matches!(
            self,
            RenderableOutcome::NonConforming | RenderableOutcome::Error
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdict {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableResult {
    pub policy: String,
    pub rule: String,
    pub device: String,
    pub outcome: RenderableOutcome,
    pub comment: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderableCounts {
    pub conforming: u32,
    pub non_conforming: u32,
    pub not_applicable: u32,
    pub disabled: u32,
    pub exempted: u32,
    pub error: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableRun {
    pub fail_on: String,
    pub policies: u32,
    pub devices: u32,
    pub rules: u32,
    pub pairs_total: u32,
    pub pairs_evaluated: u32,
    pub cancelled: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdict,
    pub counts: RenderableCounts,
    pub results: Vec<RenderableResult>,
    pub run: RenderableRun,
}

/// Decouple renderers from the report schema: timestamps and tool metadata
/// are dropped here, which also keeps rendered output byte-stable across
/// runs of the same inventory.
pub fn to_renderable(report: &ConfguardReport) -> RenderableReport {
    RenderableReport {
        verdict: match report.verdict {
            Verdict::Pass => RenderableVerdict::Pass,
            Verdict::Warn => RenderableVerdict::Warn,
            Verdict::Fail => RenderableVerdict::Fail,
        },
        counts: RenderableCounts {
            conforming: report.counts.conforming,
            non_conforming: report.counts.non_conforming,
            not_applicable: report.counts.not_applicable,
            disabled: report.counts.disabled,
            exempted: report.counts.exempted,
            error: report.counts.error,
        },
        results: report
            .results
            .iter()
            .map(|result| RenderableResult {
                policy: result.policy.clone(),
                rule: result.rule.clone(),
                device: result.device.clone(),
                outcome: match result.outcome {
                    Outcome::Conforming => RenderableOutcome::Conforming,
                    Outcome::NonConforming => RenderableOutcome::NonConforming,
                    Outcome::NotApplicable => RenderableOutcome::NotApplicable,
                    Outcome::Disabled => RenderableOutcome::Disabled,
                    Outcome::Exempted => RenderableOutcome::Exempted,
                    Outcome::Error => RenderableOutcome::Error,
                },
                comment: result.comment.clone(),
            })
            .collect(),
        run: RenderableRun {
            fail_on: report.data.fail_on.clone(),
            policies: report.data.policies,
            devices: report.data.devices,
            rules: report.data.rules,
            pairs_total: report.data.pairs_total,
            pairs_evaluated: report.data.pairs_evaluated,
            cancelled: report.data.cancelled,
            error: report.data.error.clone(),
        },
    }
}
