//! The `check` use case: load inventories, evaluate the fleet, produce a report.

use anyhow::Context;
use camino::Utf8Path;
use confguard_domain::registry::KindRegistry;
use confguard_domain::run::{CancelToken, RunOptions, compute_verdict, run_fleet};
use confguard_settings::{EffectiveConfig, Overrides};
use confguard_types::{ConfguardReport, ReportEnvelope, RunData, SCHEMA_REPORT_V1, Verdict};
use time::OffsetDateTime;

/// Input for the check use case.
#[derive(Debug)]
pub struct CheckInput<'a> {
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Restrict the run to one policy by name.
    pub only_policy: Option<String>,
    /// Restrict the run to one device by name.
    pub only_device: Option<String>,
    /// Rule evaluators, built once at startup.
    pub registry: &'a KindRegistry,
    /// Run-level cancellation; the caller owns the trigger.
    pub cancel: CancelToken,
}

/// Output from the check use case.
#[derive(Debug)]
pub struct CheckOutput {
    pub report: ConfguardReport,
    /// The resolved configuration used.
    pub effective: EffectiveConfig,
    /// Per-evaluation diagnostic lines collected during the run.
    pub log: Vec<String>,
}

/// Run the check use case: resolve config, load inventories, evaluate the
/// fleet, produce the report envelope.
///
/// Inventory problems (unreadable files, malformed TOML, uniqueness
/// violations) are run-fatal and surface as `Err`; per-rule evaluation
/// failures never do, they land in the results as `error` outcomes.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    let effective = resolve_effective(input.config_text, input.overrides)?;

    let inventory = confguard_store::load_policies(Utf8Path::new(&effective.policies))
        .context("load policies inventory")?;
    let mut policies = inventory.policies;
    let exemptions = inventory.exemptions;
    let mut devices = confguard_store::load_devices(Utf8Path::new(&effective.devices))
        .context("load devices inventory")?;

    if let Some(name) = &input.only_policy {
        policies.retain(|policy| &policy.name == name);
        anyhow::ensure!(
            !policies.is_empty(),
            "no policy named '{name}' in {}",
            effective.policies
        );
    }
    if let Some(name) = &input.only_device {
        devices.retain(|device| &device.name == name);
        anyhow::ensure!(
            !devices.is_empty(),
            "no device named '{name}' in {}",
            effective.devices
        );
    }

    let mut options = RunOptions::new(started_at);
    options.workers = effective.workers;
    options.rule_timeout = effective.rule_timeout;

    let run = run_fleet(
        &policies,
        &devices,
        &exemptions,
        input.registry,
        &options,
        &input.cancel,
    )?;
    let verdict = compute_verdict(&run.counts, effective.fail_on, run.cancelled);
    let finished_at = OffsetDateTime::now_utc();

    let rules: u32 = policies.iter().map(|policy| policy.rules.len() as u32).sum();
    let report = ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: crate::report::tool_meta(),
        started_at,
        finished_at,
        verdict,
        counts: run.counts,
        results: run.results,
        data: RunData {
            fail_on: effective.fail_on.as_str().to_string(),
            policies: policies.len() as u32,
            devices: devices.len() as u32,
            rules,
            pairs_total: run.pairs_total as u32,
            pairs_evaluated: run.pairs_evaluated as u32,
            cancelled: run.cancelled,
            error: None,
        },
    };

    Ok(CheckOutput {
        report,
        effective,
        log: run.log,
    })
}

/// Parse-or-default the config text and fold in the CLI overrides.
pub(crate) fn resolve_effective(
    config_text: &str,
    overrides: Overrides,
) -> anyhow::Result<EffectiveConfig> {
    let cfg = if config_text.trim().is_empty() {
        confguard_settings::ConfguardConfigV1::default()
    } else {
        confguard_settings::parse_config_toml(config_text).context("parse config")?
    };
    confguard_settings::resolve_config(cfg, overrides).context("resolve config")
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Warn => 0,
        Verdict::Fail => 2,
    }
}
