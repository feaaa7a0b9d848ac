use super::{Evaluation, RuleError, RuleKind};
use crate::context::EvalContext;
use crate::model::{DeviceModel, Rule, RuleDetail};
use confguard_types::ids;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptLanguage {
    JavaScript,
    Python,
}

impl ScriptLanguage {
    pub fn kind_tag(self) -> &'static str {
        match self {
            ScriptLanguage::JavaScript => ids::KIND_JAVASCRIPT,
            ScriptLanguage::Python => ids::KIND_PYTHON,
        }
    }
}

/// Failure surfaced by a script sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("script did not compile: {0}")]
    Compile(String),
    #[error("script raised: {0}")]
    Runtime(String),
    #[error("script exceeded its time budget")]
    Timeout,
}

/// Embedded-interpreter collaborator, one per scripting language.
///
/// confguard ships no interpreter; the embedder supplies a sandbox and the
/// registry adapts it to the rule contract. Implementations must be
/// deterministic for a given script and device snapshot, and should honor
/// `ctx.timeout` cooperatively (the engine also enforces it from outside).
pub trait ScriptSandbox: Send + Sync {
    fn language(&self) -> ScriptLanguage;

    /// Compile-only entry used for validation.
    fn compile(&self, script: &str) -> Result<(), SandboxError>;

    /// Run the script against one device snapshot.
    fn run(
        &self,
        script: &str,
        device: &DeviceModel,
        ctx: &mut EvalContext<'_>,
    ) -> Result<Evaluation, SandboxError>;
}

/// Adapts a `ScriptSandbox` to the rule-kind contract.
pub struct ScriptKind {
    sandbox: Arc<dyn ScriptSandbox>,
}

impl ScriptKind {
    pub fn new(sandbox: Arc<dyn ScriptSandbox>) -> Self {
        Self { sandbox }
    }
}

impl RuleKind for ScriptKind {
    fn tag(&self) -> &'static str {
        self.sandbox.language().kind_tag()
    }

    fn validate(&self, rule: &Rule) -> Result<(), RuleError> {
        let script = script_source(rule, self.sandbox.language())?;
        self.sandbox.compile(script)?;
        Ok(())
    }

    fn evaluate(
        &self,
        rule: &Rule,
        device: &DeviceModel,
        ctx: &mut EvalContext<'_>,
    ) -> Result<Evaluation, RuleError> {
        let script = script_source(rule, self.sandbox.language())?;
        Ok(self.sandbox.run(script, device, ctx)?)
    }
}

fn script_source(rule: &Rule, language: ScriptLanguage) -> Result<&str, RuleError> {
    match (&rule.detail, language) {
        (RuleDetail::JavaScript(def), ScriptLanguage::JavaScript) => Ok(&def.script),
        (RuleDetail::Python(def), ScriptLanguage::Python) => Ok(&def.script),
        (other, _) => Err(RuleError::Definition(format!(
            "'{}' evaluator received a '{}' rule",
            language.kind_tag(),
            other.kind_tag()
        ))),
    }
}
