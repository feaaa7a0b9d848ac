//! Config parsing and run-option resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{ConfguardConfigV1, SCHEMA_CONFIG_V1};
pub use resolve::{EffectiveConfig, Overrides};

/// Parse `confguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ConfguardConfigV1> {
    let cfg: ConfguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective run options (defaults + config file + CLI overrides).
pub fn resolve_config(
    cfg: ConfguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<EffectiveConfig> {
    resolve::resolve_config(cfg, overrides)
}
