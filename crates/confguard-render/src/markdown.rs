use crate::{RenderableOutcome, RenderableReport, RenderableVerdict};

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Confguard report\n\n");
    let verdict = match report.verdict {
        RenderableVerdict::Pass => "PASS",
        RenderableVerdict::Warn => "WARN",
        RenderableVerdict::Fail => "FAIL",
    };
    out.push_str(&format!(
        "- Verdict: **{}** (fail on: {})\n- Fleet: {} policies, {} devices, {} rules\n- Evaluated: {} of {} (rule, device) pairs\n\n",
        verdict,
        report.run.fail_on,
        report.run.policies,
        report.run.devices,
        report.run.rules,
        report.run.pairs_evaluated,
        report.run.pairs_total
    ));

    if report.run.cancelled {
        out.push_str("> Note: the run was cancelled; unscheduled pairs are missing from this report.\n\n");
    }
    if let Some(error) = &report.run.error {
        out.push_str(&format!("> Note: {}\n\n", error));
    }

    out.push_str("## Outcomes\n\n");
    out.push_str(&format!(
        "- conforming: {}\n- non-conforming: {}\n- not applicable: {}\n- disabled: {}\n- exempted: {}\n- errors: {}\n\n",
        report.counts.conforming,
        report.counts.non_conforming,
        report.counts.not_applicable,
        report.counts.disabled,
        report.counts.exempted,
        report.counts.error
    ));

    let flagged: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.outcome.is_flagged())
        .collect();

    if flagged.is_empty() {
        out.push_str("No violations.\n");
        return out;
    }

    out.push_str("## Violations\n\n");
    for result in flagged {
        let tag = match result.outcome {
            RenderableOutcome::NonConforming => "NON-CONFORMING",
            RenderableOutcome::Error => "ERROR",
            // is_flagged filtered everything else out.
            _ => continue,
        };
        match &result.comment {
            Some(comment) => out.push_str(&format!(
                "- [{}] `{}` / `{}` on `{}`: {}\n",
                tag, result.policy, result.rule, result.device, comment
            )),
            None => out.push_str(&format!(
                "- [{}] `{}` / `{}` on `{}`\n",
                tag, result.policy, result.rule, result.device
            )),
        }
    }

    out
}
