//! Report serialization and rendering entry points.

use anyhow::Context;
use confguard_render::{render_github_annotations, render_markdown, to_renderable};
use confguard_types::{
    ConfguardReport, OutcomeCounts, ReportEnvelope, RunData, SCHEMA_REPORT_V1, ToolMeta, Verdict,
};
use time::OffsetDateTime;

pub(crate) fn tool_meta() -> ToolMeta {
    ToolMeta {
        name: "confguard".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

pub fn serialize_report(report: &ConfguardReport) -> anyhow::Result<Vec<u8>> {
    let mut data = serde_json::to_vec_pretty(report).context("serialize report")?;
    data.push(b'\n');
    Ok(data)
}

pub fn parse_report_json(text: &str) -> anyhow::Result<ConfguardReport> {
    let report: ConfguardReport = serde_json::from_str(text).context("parse report json")?;
    anyhow::ensure!(
        report.schema == SCHEMA_REPORT_V1,
        "unknown report schema '{}' (expected {SCHEMA_REPORT_V1})",
        report.schema
    );
    Ok(report)
}

/// Report written when the run itself could not happen (unreadable
/// inventory, malformed TOML). There are no per-pair results to show, only
/// the failure, so downstream consumers still get a well-formed envelope.
pub fn runtime_error_report(message: &str) -> ConfguardReport {
    let now = OffsetDateTime::now_utc();
    ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        started_at: now,
        finished_at: now,
        verdict: Verdict::Fail,
        counts: OutcomeCounts::default(),
        results: Vec::new(),
        data: RunData {
            fail_on: "unknown".to_string(),
            error: Some(message.to_string()),
            ..RunData::default()
        },
    }
}

pub fn to_markdown(report: &ConfguardReport) -> String {
    render_markdown(&to_renderable(report))
}

pub fn to_annotations(report: &ConfguardReport) -> Vec<String> {
    render_github_annotations(&to_renderable(report))
}
