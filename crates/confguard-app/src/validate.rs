//! The `validate` use case: surface authoring errors before any device is
//! evaluated.

use anyhow::Context;
use camino::Utf8Path;
use confguard_domain::registry::{KindRegistry, ValidationIssue, validate_policies};
use confguard_settings::Overrides;

#[derive(Debug)]
pub struct ValidateInput<'a> {
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    pub overrides: Overrides,
    pub registry: &'a KindRegistry,
}

#[derive(Debug)]
pub struct ValidateOutput {
    pub issues: Vec<ValidationIssue>,
    pub policies: usize,
    pub rules: usize,
}

/// Load the policies inventory and validate every rule definition against
/// the registry. No device is touched.
pub fn run_validate(input: ValidateInput<'_>) -> anyhow::Result<ValidateOutput> {
    let effective = crate::check::resolve_effective(input.config_text, input.overrides)?;
    let inventory = confguard_store::load_policies(Utf8Path::new(&effective.policies))
        .context("load policies inventory")?;

    let rules = inventory
        .policies
        .iter()
        .map(|policy| policy.rules.len())
        .sum();
    let issues = validate_policies(&inventory.policies, input.registry);

    Ok(ValidateOutput {
        issues,
        policies: inventory.policies.len(),
        rules,
    })
}
