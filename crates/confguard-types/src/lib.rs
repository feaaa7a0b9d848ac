//! Stable DTOs and IDs used across the confguard workspace.
//!
//! This crate is intentionally boring:
//! - the outcome taxonomy and per-evaluation `CheckResult`
//! - data types for the emitted run report
//! - stable rule identity and rule-kind tags

#![forbid(unsafe_code)]

pub mod ids;
pub mod outcome;
pub mod report;

pub use ids::RuleId;
pub use outcome::{CheckResult, Outcome, OutcomeCounts};
pub use report::{
    ConfguardReport, ReportEnvelope, RunData, ToolMeta, Verdict, SCHEMA_REPORT_V1,
};
