use crate::model::ConfguardConfigV1;
use confguard_domain::run::{DEFAULT_RULE_TIMEOUT, FailOn};
use std::time::Duration;

/// CLI-provided values; each one beats the config file when present.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub fail_on: Option<String>,
    pub workers: Option<usize>,
    pub rule_timeout_ms: Option<u64>,
    pub policies: Option<String>,
    pub devices: Option<String>,
}

/// What the run actually uses after defaults, config, and overrides.
#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    pub fail_on: FailOn,
    pub workers: usize,
    pub rule_timeout: Duration,
    pub policies: String,
    pub devices: String,
}

pub fn resolve_config(
    cfg: ConfguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<EffectiveConfig> {
    let fail_on = match overrides.fail_on.as_deref().or(cfg.fail_on.as_deref()) {
        Some(value) => parse_fail_on(value)?,
        None => FailOn::NonConforming,
    };

    let workers = overrides.workers.or(cfg.workers).unwrap_or(0);

    let rule_timeout = match overrides.rule_timeout_ms.or(cfg.rule_timeout_ms) {
        Some(0) => anyhow::bail!("rule_timeout_ms must be greater than zero"),
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_RULE_TIMEOUT,
    };

    let policies = overrides
        .policies
        .or(cfg.policies)
        .unwrap_or_else(|| "policies.toml".to_string());
    let devices = overrides
        .devices
        .or(cfg.devices)
        .unwrap_or_else(|| "devices.toml".to_string());

    Ok(EffectiveConfig {
        fail_on,
        workers,
        rule_timeout,
        policies,
        devices,
    })
}

fn parse_fail_on(v: &str) -> anyhow::Result<FailOn> {
    match v {
        "non-conforming" => Ok(FailOn::NonConforming),
        "error" => Ok(FailOn::Error),
        "never" => Ok(FailOn::Never),
        other => anyhow::bail!("unknown fail_on: {other} (expected non-conforming|error|never)"),
    }
}
