use crate::{RenderableOutcome, RenderableReport};

/// Render flagged results as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level}::{message}`
///
/// Violations annotate as errors; evaluation errors annotate as warnings,
/// since they mean "could not check" rather than a confirmed violation.
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    for result in &report.results {
        let level = match result.outcome {
            RenderableOutcome::NonConforming => "error",
            RenderableOutcome::Error => "warning",
            _ => continue,
        };

        let detail = result.comment.as_deref().unwrap_or("no detail");
        let message = format!(
            "[{}/{}] {}: {}",
            result.policy, result.rule, result.device, detail
        )
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");

        out.push(format!("::{}::{}", level, message));
    }

    out
}
