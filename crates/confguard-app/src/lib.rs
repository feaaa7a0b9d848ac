//! Use case orchestration for confguard.
//!
//! This crate provides the application layer: use cases that coordinate the
//! domain, store, and render layers. It is intentionally thin and delegates
//! heavy lifting to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod check;
mod report;
mod validate;

pub use check::{CheckInput, CheckOutput, run_check, verdict_exit_code};
pub use confguard_types::ConfguardReport;
pub use report::{
    parse_report_json, runtime_error_report, serialize_report, to_annotations, to_markdown,
};
pub use validate::{ValidateInput, ValidateOutput, run_validate};
