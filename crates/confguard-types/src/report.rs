use crate::{CheckResult, OutcomeCounts};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable schema identifier for confguard run reports.
pub const SCHEMA_REPORT_V1: &str = "confguard.report.v1";

/// Run verdict, mapped to CI signals by the caller.
///
/// `Warn` means flagged outcomes exist but the configured `fail_on` policy
/// did not select them (or the run was cancelled before completing).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Confguard-specific summary payload for the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct RunData {
    pub fail_on: String,

    pub policies: u32,
    pub devices: u32,
    pub rules: u32,

    /// (rule, device) pairs selected by policy targets.
    pub pairs_total: u32,
    /// Pairs actually evaluated; lower than `pairs_total` after cancellation.
    pub pairs_evaluated: u32,

    pub cancelled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A run report envelope with a versioned outer shape and a
/// tool-defined `data` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportEnvelope<TData = RunData> {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub verdict: Verdict,
    pub counts: OutcomeCounts,
    pub results: Vec<CheckResult>,
    pub data: TData,
}

pub type ConfguardReport = ReportEnvelope<RunData>;
