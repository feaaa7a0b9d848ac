//! Pure rule evaluation (no IO).
//!
//! Input: policies, devices, and exemptions loaded elsewhere.
//! Output: one `CheckResult` per (rule, device) pair, plus a run verdict.

#![forbid(unsafe_code)]

pub mod context;
pub mod exemption;
pub mod kinds;
pub mod model;
pub mod registry;
pub mod run;

mod engine;

pub use engine::{evaluate_policy, evaluate_rule};

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;
