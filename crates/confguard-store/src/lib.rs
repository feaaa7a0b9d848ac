//! Inventory adapters: read and parse policies and device snapshots.
//!
//! This crate is allowed to do filesystem IO. Shape validation (uniqueness,
//! kind fields, target globs) lives here; rule-kind validation such as
//! regex compilation belongs to the registry's validate pass.

#![forbid(unsafe_code)]

mod load;
mod model;

pub use load::{Inventory, load_devices, load_policies, parse_devices, parse_policies};
pub use model::{
    DeviceEntryV1, DevicesFileV1, ExemptionEntryV1, PoliciesFileV1, PolicyEntryV1, RuleEntryV1,
    SCHEMA_DEVICES_V1, SCHEMA_POLICIES_V1,
};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    /// Parse arbitrary text as a policies inventory.
    ///
    /// Returns `Ok(...)` when the text is a well-formed inventory,
    /// `Err(...)` otherwise. **Never panics** on any input.
    pub fn parse_policies(text: &str) -> anyhow::Result<()> {
        let _ = super::parse_policies(text)?;
        Ok(())
    }

    /// Parse arbitrary text as a devices inventory.
    ///
    /// Returns `Ok(...)` when the text is a well-formed inventory,
    /// `Err(...)` otherwise. **Never panics** on any input.
    pub fn parse_devices(text: &str) -> anyhow::Result<()> {
        let _ = super::parse_devices(text)?;
        Ok(())
    }
}
