use crate::context::{BufferLog, EvalContext};
use crate::engine::evaluate_rule;
use crate::exemption::ExemptionSet;
use crate::model::{DeviceModel, Policy, Rule, build_target_set, target_matches};
use crate::registry::KindRegistry;
use confguard_types::{CheckResult, OutcomeCounts, Verdict};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

pub const DEFAULT_RULE_TIMEOUT: Duration = Duration::from_secs(5);

/// Which outcomes fail a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOn {
    /// Violations fail the run, and so do evaluation errors.
    NonConforming,
    /// Only evaluation errors fail the run.
    Error,
    /// Report-only mode; nothing fails the run.
    Never,
}

impl FailOn {
    pub fn as_str(self) -> &'static str {
        match self {
            FailOn::NonConforming => "non-conforming",
            FailOn::Error => "error",
            FailOn::Never => "never",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    /// Worker pool size; 0 lets rayon pick.
    pub workers: usize,
    /// Per-evaluation budget handed to kinds and enforced by the engine.
    pub rule_timeout: Duration,
    /// The evaluation instant; exemption expiry is checked against this.
    pub now: OffsetDateTime,
}

impl RunOptions {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            workers: 0,
            rule_timeout: DEFAULT_RULE_TIMEOUT,
            now,
        }
    }
}

/// Cooperative run-level cancellation.
///
/// Once set, not-yet-started (rule, device) pairs are skipped; in-flight
/// evaluations finish and their results stay valid.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Everything one fleet run produces.
#[derive(Debug)]
pub struct FleetRun {
    /// One result per evaluated pair, in (policy, device, rule) order.
    pub results: Vec<CheckResult>,
    pub counts: OutcomeCounts,
    /// Diagnostic lines collected from per-evaluation sinks.
    pub log: Vec<String>,
    pub cancelled: bool,
    pub pairs_total: usize,
    pub pairs_evaluated: usize,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to build evaluation worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("policy '{policy}' has an invalid target glob: {source}")]
    TargetGlob {
        policy: String,
        #[source]
        source: globset::Error,
    },
}

/// Evaluate every policy against every targeted device on a bounded pool.
///
/// Each (rule, device) pair is independent and reads only shared immutable
/// state, so pairs run in parallel; results come back in pair order
/// regardless of which worker finishes first. Nothing is cached across
/// runs: exemptions and device snapshots may have changed since the last
/// one.
pub fn run_fleet(
    policies: &[Policy],
    devices: &[DeviceModel],
    exemptions: &ExemptionSet,
    registry: &KindRegistry,
    options: &RunOptions,
    cancel: &CancelToken,
) -> Result<FleetRun, RunError> {
    struct Pair<'a> {
        rule: &'a Rule,
        device: &'a DeviceModel,
    }

    let mut pairs: Vec<Pair<'_>> = Vec::new();
    for policy in policies {
        let targets =
            build_target_set(&policy.targets).map_err(|source| RunError::TargetGlob {
                policy: policy.name.clone(),
                source,
            })?;
        for device in devices {
            if !target_matches(targets.as_ref(), &device.name) {
                continue;
            }
            for rule in &policy.rules {
                pairs.push(Pair { rule, device });
            }
        }
    }
    let pairs_total = pairs.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()?;

    let evaluated: Vec<Option<(CheckResult, Vec<String>)>> = pool.install(|| {
        pairs
            .par_iter()
            .map(|pair| {
                if cancel.is_cancelled() {
                    return None;
                }
                let mut log = BufferLog::default();
                let mut ctx = EvalContext::new(options.now, options.rule_timeout, &mut log);
                let result = evaluate_rule(pair.rule, pair.device, exemptions, registry, &mut ctx);
                Some((result, log.lines))
            })
            .collect()
    });

    let mut results = Vec::with_capacity(pairs_total);
    let mut log = Vec::new();
    for entry in evaluated.into_iter().flatten() {
        let (result, lines) = entry;
        results.push(result);
        log.extend(lines);
    }

    let counts = OutcomeCounts::from_results(&results);
    let pairs_evaluated = results.len();

    Ok(FleetRun {
        results,
        counts,
        log,
        cancelled: cancel.is_cancelled(),
        pairs_total,
        pairs_evaluated,
    })
}

/// Fold run counts into a verdict.
///
/// Cancelled runs never pass: partial coverage must not read as a clean
/// bill of health.
pub fn compute_verdict(counts: &OutcomeCounts, fail_on: FailOn, cancelled: bool) -> Verdict {
    let failed = match fail_on {
        FailOn::NonConforming => counts.non_conforming > 0 || counts.error > 0,
        FailOn::Error => counts.error > 0,
        FailOn::Never => false,
    };
    if failed {
        return Verdict::Fail;
    }
    if cancelled || counts.non_conforming > 0 || counts.error > 0 {
        return Verdict::Warn;
    }
    Verdict::Pass
}
