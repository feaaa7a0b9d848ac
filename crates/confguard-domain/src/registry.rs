use crate::kinds::{RuleKind, ScriptKind, ScriptSandbox, TextKind};
use crate::model::Policy;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Process-wide table of rule evaluators, keyed by kind tag.
///
/// Built once at startup (`builtin()` plus any sandboxes the embedder
/// supplies) and then only read. There is deliberately no way to mutate it
/// afterwards; a run holds `&KindRegistry` the whole time.
pub struct KindRegistry {
    kinds: BTreeMap<&'static str, Arc<dyn RuleKind>>,
}

impl KindRegistry {
    /// Registry with the built-in text kind only.
    pub fn builtin() -> Self {
        let mut registry = Self {
            kinds: BTreeMap::new(),
        };
        registry.register(Arc::new(TextKind));
        registry
    }

    /// Add a script kind backed by the given sandbox.
    pub fn with_sandbox(mut self, sandbox: Arc<dyn ScriptSandbox>) -> Self {
        self.register(Arc::new(ScriptKind::new(sandbox)));
        self
    }

    fn register(&mut self, kind: Arc<dyn RuleKind>) {
        self.kinds.insert(kind.tag(), kind);
    }

    pub fn get(&self, tag: &str) -> Option<&dyn RuleKind> {
        self.kinds.get(tag).map(|kind| kind.as_ref())
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// An authoring problem surfaced before any device is evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub policy: String,
    pub rule: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}: {}", self.policy, self.rule, self.message)
    }
}

/// Validate every rule definition against the registry, without touching
/// any device.
///
/// Rules whose kind has no registered evaluator are reported here so they
/// cannot slip through silently (at evaluation time they degrade to a
/// not_applicable outcome).
pub fn validate_policies(policies: &[Policy], registry: &KindRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for policy in policies {
        for rule in &policy.rules {
            match registry.get(rule.kind_tag()) {
                None => issues.push(ValidationIssue {
                    policy: policy.name.clone(),
                    rule: rule.name.clone(),
                    message: format!(
                        "no evaluator registered for kind '{}'",
                        rule.kind_tag()
                    ),
                }),
                Some(kind) => {
                    if let Err(err) = kind.validate(rule) {
                        issues.push(ValidationIssue {
                            policy: policy.name.clone(),
                            rule: rule.name.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
    }
    issues
}
