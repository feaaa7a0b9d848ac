use crate::context::EvalContext;
use crate::exemption::ExemptionSet;
use crate::kinds::Conformance;
use crate::model::{DeviceModel, Policy, Rule};
use crate::registry::KindRegistry;
use confguard_types::{CheckResult, Outcome};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Evaluate one rule against one device.
///
/// The precedence decision lives only here, never in kinds:
/// 1. disabled rules short-circuit to `disabled`;
/// 2. an active exemption short-circuits to `exempted`;
/// 3. otherwise the kind's verdict decides, with a missing evaluator
///    degrading to `not_applicable` (the contract's no-op default).
///
/// Kind failures (`Err`, panic, timeout overrun measured around the
/// delegate call) are captured into an `error` outcome so one bad rule can
/// never abort its siblings. Nothing here mutates rule, policy, or
/// exemption state.
pub fn evaluate_rule(
    rule: &Rule,
    device: &DeviceModel,
    exemptions: &ExemptionSet,
    registry: &KindRegistry,
    ctx: &mut EvalContext<'_>,
) -> CheckResult {
    if !rule.enabled {
        ctx.info(&format!(
            "{rule} is disabled; skipped for device '{}'",
            device.name
        ));
        return result(rule, device, Outcome::Disabled, None);
    }

    if exemptions.is_exempted(rule.id, &device.name, ctx.now) {
        ctx.info(&format!("device '{}' is exempt from {rule}", device.name));
        return result(rule, device, Outcome::Exempted, None);
    }

    let Some(kind) = registry.get(rule.kind_tag()) else {
        let message = format!("no evaluator registered for kind '{}'", rule.kind_tag());
        ctx.error(&format!("{rule}: {message}"));
        return result(rule, device, Outcome::NotApplicable, Some(message));
    };

    let started = Instant::now();
    let delegate = panic::catch_unwind(AssertUnwindSafe(|| kind.evaluate(rule, device, ctx)));
    let elapsed = started.elapsed();

    match delegate {
        Err(payload) => {
            let message = format!("rule evaluation panicked: {}", panic_message(payload.as_ref()));
            ctx.error(&format!("{rule} on device '{}': {message}", device.name));
            result(rule, device, Outcome::Error, Some(message))
        }
        Ok(Err(err)) => {
            ctx.error(&format!(
                "{rule} failed on device '{}': {err}",
                device.name
            ));
            result(rule, device, Outcome::Error, Some(err.to_string()))
        }
        Ok(Ok(_)) if elapsed > ctx.timeout => {
            let message = format!(
                "evaluation exceeded its {}ms budget",
                ctx.timeout.as_millis()
            );
            ctx.error(&format!("{rule} on device '{}': {message}", device.name));
            result(rule, device, Outcome::Error, Some(message))
        }
        Ok(Ok(eval)) => {
            let outcome = match eval.conformance {
                Conformance::Conforming => Outcome::Conforming,
                Conformance::NonConforming => Outcome::NonConforming,
                Conformance::NotApplicable => Outcome::NotApplicable,
            };
            result(rule, device, outcome, eval.comment)
        }
    }
}

/// Evaluate every rule in a policy against one device, in rule order.
///
/// Isolation comes from `evaluate_rule`: a failing rule contributes an
/// `error` result and its siblings still run.
pub fn evaluate_policy(
    policy: &Policy,
    device: &DeviceModel,
    exemptions: &ExemptionSet,
    registry: &KindRegistry,
    ctx: &mut EvalContext<'_>,
) -> Vec<CheckResult> {
    policy
        .rules
        .iter()
        .map(|rule| evaluate_rule(rule, device, exemptions, registry, ctx))
        .collect()
}

fn result(
    rule: &Rule,
    device: &DeviceModel,
    outcome: Outcome,
    comment: Option<String>,
) -> CheckResult {
    CheckResult {
        policy: rule.policy.clone(),
        rule: rule.name.clone(),
        rule_id: rule.id,
        device: device.name.clone(),
        outcome,
        comment,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BufferLog, NullLog};
    use crate::exemption::{Exemption, ExemptionSet};
    use crate::registry::KindRegistry;
    use crate::test_support::{
        NOW, StubBehavior, StubSandbox, device, exemption, exemption_set, js_rule, policy,
        text_rule,
    };
    use confguard_types::RuleId;
    use std::time::Duration;
    use time::macros::datetime;

    const EDGE2_CONFIG: &str = "hostname edge-2\nbanner motd ^C\nAuthorized access only\n^C\n";

    fn check(
        rule: &crate::model::Rule,
        dev: &crate::model::DeviceModel,
        exemptions: &ExemptionSet,
        registry: &KindRegistry,
    ) -> CheckResult {
        let mut log = NullLog;
        let mut ctx = EvalContext::new(NOW, Duration::from_secs(5), &mut log);
        evaluate_rule(rule, dev, exemptions, registry, &mut ctx)
    }

    #[test]
    fn disabled_rule_short_circuits_before_everything() {
        // The sandbox panics if invoked, so a non-disabled path would fail loudly.
        let registry = KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Panic));
        let mut checked = js_rule(1, "ntp-check");
        checked.enabled = false;

        let dev = device("edge-1", "ios", &[]);
        let result = check(&checked, &dev, &ExemptionSet::new(), &registry);
        assert_eq!(result.outcome, Outcome::Disabled);
        assert!(result.comment.is_none());
    }

    #[test]
    fn disabled_dominates_exemption() {
        let registry = KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Panic));
        let mut checked = js_rule(1, "ntp-check");
        checked.enabled = false;

        let dev = device("edge-1", "ios", &[]);
        let exemptions = exemption_set(vec![exemption(1, "edge-1")]);
        let result = check(&checked, &dev, &exemptions, &registry);
        assert_eq!(result.outcome, Outcome::Disabled);
    }

    #[test]
    fn active_exemption_suppresses_without_invoking_the_kind() {
        let registry = KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Panic));
        let checked = js_rule(1, "ntp-check");

        let dev = device("edge-1", "ios", &[]);
        let exemptions = exemption_set(vec![exemption(1, "edge-1")]);
        // A panic here would surface as an error outcome; exemption must win instead.
        let result = check(&checked, &dev, &exemptions, &registry);
        assert_eq!(result.outcome, Outcome::Exempted);
    }

    #[test]
    fn expired_exemption_falls_through_to_the_kind() {
        let registry =
            KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Conform));
        let checked = js_rule(1, "ntp-check");

        let dev = device("edge-1", "ios", &[]);
        let exemptions = exemption_set(vec![Exemption {
            rule: RuleId::new(1),
            device: "edge-1".into(),
            expires: Some(datetime!(2026-01-01 00:00 UTC)),
        }]);
        let result = check(&checked, &dev, &exemptions, &registry);
        assert_eq!(result.outcome, Outcome::Conforming);
    }

    #[test]
    fn unregistered_kind_degrades_to_not_applicable() {
        let registry = KindRegistry::builtin();
        let checked = js_rule(1, "ntp-check");

        let dev = device("edge-1", "ios", &[]);
        let result = check(&checked, &dev, &ExemptionSet::new(), &registry);
        assert_eq!(result.outcome, Outcome::NotApplicable);
        assert_eq!(
            result.comment.as_deref(),
            Some("no evaluator registered for kind 'javascript'")
        );
    }

    #[test]
    fn kind_verdicts_map_onto_outcomes() {
        let registry = KindRegistry::builtin();
        let dev = device("edge-2", "ios", &[("running-config", EDGE2_CONFIG)]);

        let conforming = text_rule(1, "banner-check", "Authorized access only");
        let result = check(&conforming, &dev, &ExemptionSet::new(), &registry);
        assert_eq!(result.outcome, Outcome::Conforming);

        let violated = text_rule(2, "syslog-check", "logging host");
        let result = check(&violated, &dev, &ExemptionSet::new(), &registry);
        assert_eq!(result.outcome, Outcome::NonConforming);
    }

    #[test]
    fn kind_failure_is_captured_as_an_error_outcome() {
        let registry =
            KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Fail("boom")));
        let checked = js_rule(1, "ntp-check");

        let dev = device("edge-1", "ios", &[]);
        let result = check(&checked, &dev, &ExemptionSet::new(), &registry);
        assert_eq!(result.outcome, Outcome::Error);
        assert!(result.comment.unwrap().contains("boom"));
    }

    #[test]
    fn kind_panic_is_captured_as_an_error_outcome() {
        let registry = KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Panic));
        let checked = js_rule(1, "ntp-check");

        let dev = device("edge-1", "ios", &[]);
        let result = check(&checked, &dev, &ExemptionSet::new(), &registry);
        assert_eq!(result.outcome, Outcome::Error);
        assert!(
            result
                .comment
                .unwrap()
                .contains("rule evaluation panicked: sandbox must not be invoked")
        );
    }

    #[test]
    fn overrunning_the_budget_is_an_error_outcome() {
        let registry = KindRegistry::builtin()
            .with_sandbox(StubSandbox::js(StubBehavior::Sleep(Duration::from_millis(30))));
        let checked = js_rule(1, "ntp-check");

        let dev = device("edge-1", "ios", &[]);
        let mut log = NullLog;
        let mut ctx = EvalContext::new(NOW, Duration::from_millis(1), &mut log);
        let result = evaluate_rule(&checked, &dev, &ExemptionSet::new(), &registry, &mut ctx);
        assert_eq!(result.outcome, Outcome::Error);
        assert!(result.comment.unwrap().contains("1ms budget"));
    }

    #[test]
    fn policy_run_isolates_a_failing_rule() {
        let registry =
            KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Fail("boom")));
        let checked = policy(
            "baseline",
            vec![
                text_rule(1, "banner-check", "Authorized access only"),
                js_rule(2, "ntp-check"),
                text_rule(3, "hostname-check", "hostname"),
            ],
        );
        let dev = device("edge-2", "ios", &[("running-config", EDGE2_CONFIG)]);

        let mut log = NullLog;
        let mut ctx = EvalContext::new(NOW, Duration::from_secs(5), &mut log);
        let results = evaluate_policy(&checked, &dev, &ExemptionSet::new(), &registry, &mut ctx);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].outcome, Outcome::Conforming);
        assert_eq!(results[1].outcome, Outcome::Error);
        assert_eq!(results[2].outcome, Outcome::Conforming);
        // Order is rule order, so reports are comparable run-to-run.
        assert_eq!(results[0].rule, "banner-check");
        assert_eq!(results[1].rule, "ntp-check");
        assert_eq!(results[2].rule, "hostname-check");
    }

    #[test]
    fn failures_are_logged_with_rule_and_device_context() {
        let registry =
            KindRegistry::builtin().with_sandbox(StubSandbox::js(StubBehavior::Fail("boom")));
        let checked = js_rule(7, "ntp-check");
        let dev = device("edge-1", "ios", &[]);

        let mut log = BufferLog::default();
        let mut ctx = EvalContext::new(NOW, Duration::from_secs(5), &mut log);
        evaluate_rule(&checked, &dev, &ExemptionSet::new(), &registry, &mut ctx);

        assert_eq!(log.lines.len(), 1);
        let line = &log.lines[0];
        assert!(line.starts_with("error:"));
        assert!(line.contains("compliance rule 7 (name 'ntp-check')"));
        assert!(line.contains("edge-1"));
        assert!(line.contains("boom"));
    }
}
