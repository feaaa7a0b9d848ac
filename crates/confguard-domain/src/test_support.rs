use crate::context::EvalContext;
use crate::exemption::{Exemption, ExemptionSet};
use crate::kinds::{Evaluation, SandboxError, ScriptLanguage, ScriptSandbox};
use crate::model::{DeviceModel, Policy, Rule, RuleDetail, ScriptRule, TextRule};
use confguard_types::RuleId;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::datetime;

pub const NOW: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

pub fn device(name: &str, driver: &str, attributes: &[(&str, &str)]) -> DeviceModel {
    DeviceModel {
        name: name.to_string(),
        driver: driver.to_string(),
        attributes: attributes
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    }
}

pub fn rule(id: u64, name: &str, detail: RuleDetail) -> Rule {
    Rule {
        id: RuleId::new(id),
        name: name.to_string(),
        policy: "baseline".to_string(),
        enabled: true,
        detail,
    }
}

pub fn text_rule(id: u64, name: &str, pattern: &str) -> Rule {
    rule(
        id,
        name,
        RuleDetail::Text(TextRule {
            field: "running-config".to_string(),
            pattern: pattern.to_string(),
            ..TextRule::default()
        }),
    )
}

pub fn js_rule(id: u64, name: &str) -> Rule {
    rule(
        id,
        name,
        RuleDetail::JavaScript(ScriptRule {
            script: "check(device)".to_string(),
        }),
    )
}

pub fn policy(name: &str, rules: Vec<Rule>) -> Policy {
    Policy {
        name: name.to_string(),
        targets: Vec::new(),
        rules,
    }
}

pub fn exemption(rule: u64, device: &str) -> Exemption {
    Exemption {
        rule: RuleId::new(rule),
        device: device.to_string(),
        expires: None,
    }
}

pub fn exemption_set(entries: Vec<Exemption>) -> ExemptionSet {
    let mut set = ExemptionSet::new();
    for entry in entries {
        set.add(entry);
    }
    set
}

/// Scripted sandbox: each behavior exercises one engine path.
pub enum StubBehavior {
    Conform,
    Violate(&'static str),
    Fail(&'static str),
    Panic,
    Sleep(Duration),
}

pub struct StubSandbox {
    pub language: ScriptLanguage,
    pub behavior: StubBehavior,
}

impl StubSandbox {
    pub fn js(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            language: ScriptLanguage::JavaScript,
            behavior,
        })
    }
}

impl ScriptSandbox for StubSandbox {
    fn language(&self) -> ScriptLanguage {
        self.language
    }

    fn compile(&self, _script: &str) -> Result<(), SandboxError> {
        Ok(())
    }

    fn run(
        &self,
        _script: &str,
        _device: &DeviceModel,
        _ctx: &mut EvalContext<'_>,
    ) -> Result<Evaluation, SandboxError> {
        match &self.behavior {
            StubBehavior::Conform => Ok(Evaluation::conforming("script returned ok")),
            StubBehavior::Violate(message) => Ok(Evaluation::non_conforming(*message)),
            StubBehavior::Fail(message) => Err(SandboxError::Runtime((*message).to_string())),
            StubBehavior::Panic => panic!("sandbox must not be invoked"),
            StubBehavior::Sleep(pause) => {
                std::thread::sleep(*pause);
                Ok(Evaluation::conforming("slow script finished"))
            }
        }
    }
}
