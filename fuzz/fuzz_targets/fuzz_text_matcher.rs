//! Fuzz target for the text rule kind.
//!
//! Goal: evaluation should **never panic** on any pattern, context, or
//! configuration text. Bad regexes must surface as `RuleError`, never as
//! a panic inside the matcher.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_text_matcher
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::time::Duration;

use confguard_domain::context::{EvalContext, NullLog};
use confguard_domain::kinds::{RuleKind, TextKind};
use confguard_domain::model::{DeviceModel, Rule, RuleDetail, TextRule};
use confguard_types::RuleId;

/// Structured input so libFuzzer explores the matcher flags, not just the
/// pattern text.
#[derive(Arbitrary, Debug)]
struct MatcherInput {
    pattern: String,
    context: Option<String>,
    config: String,
    regex: bool,
    invert: bool,
    match_all: bool,
}

fuzz_target!(|input: MatcherInput| {
    // Limit input size to avoid OOM and keep fuzzing fast
    if input.pattern.len() > 256 {
        return;
    }
    if input.context.as_ref().is_some_and(|c| c.len() > 256) {
        return;
    }
    if input.config.len() > 4096 {
        return;
    }

    let rule = Rule {
        id: RuleId::new(1),
        name: "fuzzed".to_string(),
        policy: "fuzz".to_string(),
        enabled: true,
        detail: RuleDetail::Text(TextRule {
            driver: None,
            field: "running-config".to_string(),
            context: input.context,
            pattern: input.pattern,
            regex: input.regex,
            invert: input.invert,
            match_all: input.match_all,
        }),
    };

    let mut device = DeviceModel {
        name: "fuzz-device".to_string(),
        driver: "ios".to_string(),
        ..DeviceModel::default()
    };
    device
        .attributes
        .insert("running-config".to_string(), input.config);

    let mut log = NullLog;
    let mut ctx = EvalContext::new(
        time::OffsetDateTime::UNIX_EPOCH,
        Duration::from_secs(1),
        &mut log,
    );

    // Should never panic - errors are fine
    let _ = TextKind.evaluate(&rule, &device, &mut ctx);
});
