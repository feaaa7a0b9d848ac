//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Outcome counting and its permutation invariance
//! - Evaluation precedence (disabled > exempted > kind verdict)
//! - Literal text matching agreeing with substring search
//! - Verdict folding and fleet-run determinism

use crate::context::{EvalContext, NullLog};
use crate::engine::evaluate_rule;
use crate::exemption::{Exemption, ExemptionSet};
use crate::model::{DeviceModel, Rule, RuleDetail};
use crate::registry::KindRegistry;
use crate::run::{CancelToken, FailOn, RunOptions, compute_verdict, run_fleet};
use crate::test_support::{NOW, device, js_rule, policy, text_rule};
use confguard_types::{CheckResult, Outcome, OutcomeCounts, RuleId, Verdict};
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Strategy for device names (hostname-shaped, non-empty).
fn arb_device_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}").unwrap()
}

/// Strategy covering the whole closed outcome set.
fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Conforming),
        Just(Outcome::NonConforming),
        Just(Outcome::NotApplicable),
        Just(Outcome::Disabled),
        Just(Outcome::Exempted),
        Just(Outcome::Error),
    ]
}

/// Strategy for one check result (used by the counting properties).
fn arb_result() -> impl Strategy<Value = CheckResult> {
    (
        arb_device_name(),
        1u64..1000,
        arb_outcome(),
        prop::option::of("[a-z ]{1,30}"),
    )
        .prop_map(|(device, id, outcome, comment)| CheckResult {
            policy: "baseline".to_string(),
            rule: format!("rule-{id}"),
            rule_id: RuleId::new(id),
            device,
            outcome,
            comment,
        })
}

/// Strategy for configuration-shaped attribute text.
fn arb_config_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("([a-z0-9 -]{0,20}\n){0,8}").unwrap()
}

/// Strategy for literal (non-regex) patterns.
fn arb_pattern() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9 -]{0,11}").unwrap()
}

// ============================================================================
// Property tests: outcome counting
// ============================================================================

proptest! {
    /// Every result lands in exactly one bucket.
    #[test]
    fn counts_total_matches_result_count(results in prop::collection::vec(arb_result(), 0..40)) {
        let counts = OutcomeCounts::from_results(&results);
        prop_assert_eq!(counts.total() as usize, results.len());

        let flagged = results.iter().filter(|r| r.outcome.is_flagged()).count();
        prop_assert_eq!(
            (counts.non_conforming + counts.error) as usize,
            flagged,
            "flagged tally must match the non_conforming and error buckets"
        );
    }

    /// Counting ignores result order.
    #[test]
    fn counts_are_permutation_invariant(
        results in prop::collection::vec(arb_result(), 0..40),
        seed in any::<u64>(),
    ) {
        use rand::SeedableRng;
        use rand::seq::SliceRandom;

        let baseline = OutcomeCounts::from_results(&results);

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut shuffled = results.clone();
        shuffled.shuffle(&mut rng);

        prop_assert_eq!(OutcomeCounts::from_results(&shuffled), baseline);
    }
}

// ============================================================================
// Property tests: evaluation precedence
// ============================================================================

proptest! {
    /// A disabled rule reports disabled no matter what else holds.
    #[test]
    fn disabled_always_wins(
        device_name in arb_device_name(),
        exempt in any::<bool>(),
    ) {
        let mut checked = js_rule(1, "ntp-check");
        checked.enabled = false;

        let dev = device(&device_name, "ios", &[]);
        let mut exemptions = ExemptionSet::new();
        if exempt {
            exemptions.add(Exemption {
                rule: RuleId::new(1),
                device: device_name.clone(),
                expires: None,
            });
        }

        // No sandbox is registered, so reaching the registry would surface
        // as not_applicable instead of disabled.
        let registry = KindRegistry::builtin();
        let mut log = NullLog;
        let mut ctx = EvalContext::new(NOW, Duration::from_secs(5), &mut log);
        let result = evaluate_rule(&checked, &dev, &exemptions, &registry, &mut ctx);

        prop_assert_eq!(result.outcome, Outcome::Disabled);
    }

    /// Exemption expiry is strict: the deadline must lie after the
    /// evaluation instant for the exemption to hold.
    #[test]
    fn exemption_expiry_is_checked_against_now(hours in -200i64..200) {
        let checked = js_rule(1, "ntp-check");
        let dev = device("edge-1", "ios", &[]);

        let mut exemptions = ExemptionSet::new();
        exemptions.add(Exemption {
            rule: RuleId::new(1),
            device: "edge-1".to_string(),
            expires: Some(NOW + time::Duration::hours(hours)),
        });

        let registry = KindRegistry::builtin();
        let mut log = NullLog;
        let mut ctx = EvalContext::new(NOW, Duration::from_secs(5), &mut log);
        let result = evaluate_rule(&checked, &dev, &exemptions, &registry, &mut ctx);

        // With no sandbox registered the only two reachable outcomes are
        // exempted (active) and not_applicable (lapsed, falls through).
        if hours > 0 {
            prop_assert_eq!(result.outcome, Outcome::Exempted);
        } else {
            prop_assert_eq!(result.outcome, Outcome::NotApplicable);
        }
    }
}

// ============================================================================
// Property tests: text matching
// ============================================================================

proptest! {
    /// Literal matching agrees with plain substring search.
    #[test]
    fn literal_match_agrees_with_substring_search(
        config in arb_config_text(),
        pattern in arb_pattern(),
    ) {
        let checked = text_rule(1, "pattern-check", &pattern);
        let dev = device("edge-1", "ios", &[("running-config", config.as_str())]);

        let registry = KindRegistry::builtin();
        let mut log = NullLog;
        let mut ctx = EvalContext::new(NOW, Duration::from_secs(5), &mut log);
        let result = evaluate_rule(&checked, &dev, &ExemptionSet::new(), &registry, &mut ctx);

        let expected = if config.contains(&pattern) {
            Outcome::Conforming
        } else {
            Outcome::NonConforming
        };
        prop_assert_eq!(result.outcome, expected);
    }

    /// Inverting a rule swaps conforming and non-conforming, never
    /// producing anything else.
    #[test]
    fn invert_flips_the_verdict(
        config in arb_config_text(),
        pattern in arb_pattern(),
    ) {
        let plain = text_rule(1, "pattern-check", &pattern);
        let mut inverted = text_rule(2, "pattern-check", &pattern);
        if let RuleDetail::Text(ref mut text) = inverted.detail {
            text.invert = true;
        }

        let dev = device("edge-1", "ios", &[("running-config", config.as_str())]);
        let registry = KindRegistry::builtin();

        let mut log = NullLog;
        let mut ctx = EvalContext::new(NOW, Duration::from_secs(5), &mut log);
        let a = evaluate_rule(&plain, &dev, &ExemptionSet::new(), &registry, &mut ctx);
        let b = evaluate_rule(&inverted, &dev, &ExemptionSet::new(), &registry, &mut ctx);

        match a.outcome {
            Outcome::Conforming => prop_assert_eq!(b.outcome, Outcome::NonConforming),
            Outcome::NonConforming => prop_assert_eq!(b.outcome, Outcome::Conforming),
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }
}

// ============================================================================
// Property tests: verdicts and fleet runs
// ============================================================================

proptest! {
    /// `never` mode reports but must not fail the run.
    #[test]
    fn fail_on_never_never_fails(
        results in prop::collection::vec(arb_result(), 0..40),
        cancelled in any::<bool>(),
    ) {
        let counts = OutcomeCounts::from_results(&results);
        prop_assert_ne!(compute_verdict(&counts, FailOn::Never, cancelled), Verdict::Fail);
    }

    /// A pass certifies a clean, complete run under every fail-on mode.
    #[test]
    fn pass_implies_clean_and_complete(
        results in prop::collection::vec(arb_result(), 0..40),
        cancelled in any::<bool>(),
    ) {
        let counts = OutcomeCounts::from_results(&results);
        for fail_on in [FailOn::NonConforming, FailOn::Error, FailOn::Never] {
            if compute_verdict(&counts, fail_on, cancelled) == Verdict::Pass {
                prop_assert!(!cancelled, "cancelled runs must not pass");
                prop_assert_eq!(counts.non_conforming, 0);
                prop_assert_eq!(counts.error, 0);
            }
        }
    }

    /// The same fleet evaluated twice yields identical results, workers
    /// or no workers.
    #[test]
    fn fleet_runs_are_deterministic(
        configs in prop::collection::vec(arb_config_text(), 1..4),
        patterns in prop::collection::vec(arb_pattern(), 1..4),
    ) {
        let devices: Vec<DeviceModel> = configs
            .iter()
            .enumerate()
            .map(|(i, config)| {
                device(&format!("edge-{i}"), "ios", &[("running-config", config.as_str())])
            })
            .collect();
        let rules: Vec<Rule> = patterns
            .iter()
            .enumerate()
            .map(|(i, pattern)| text_rule(i as u64 + 1, &format!("check-{i}"), pattern))
            .collect();
        let policies = vec![policy("baseline", rules)];

        let registry = KindRegistry::builtin();
        let mut options = RunOptions::new(NOW);
        options.workers = 2;

        let first = run_fleet(
            &policies,
            &devices,
            &ExemptionSet::new(),
            &registry,
            &options,
            &CancelToken::new(),
        )
        .unwrap();
        let second = run_fleet(
            &policies,
            &devices,
            &ExemptionSet::new(),
            &registry,
            &options,
            &CancelToken::new(),
        )
        .unwrap();

        prop_assert_eq!(first.results, second.results);
        prop_assert_eq!(first.counts.total() as usize, first.pairs_evaluated);
    }
}
