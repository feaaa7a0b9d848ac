use crate::model::{
    DevicesFileV1, PoliciesFileV1, RuleEntryV1, SCHEMA_DEVICES_V1, SCHEMA_POLICIES_V1,
};
use anyhow::Context;
use camino::Utf8Path;
use confguard_domain::exemption::{Exemption, ExemptionSet};
use confguard_domain::model::{DeviceModel, Policy, Rule, RuleDetail, ScriptRule, TextRule};
use confguard_types::{RuleId, ids};
use globset::Glob;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Policies plus the exemptions they carry, ready for the engine.
#[derive(Debug, Default)]
pub struct Inventory {
    pub policies: Vec<Policy>,
    pub exemptions: ExemptionSet,
}

pub fn load_policies(path: &Utf8Path) -> anyhow::Result<Inventory> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    parse_policies(&text).with_context(|| format!("parse {path}"))
}

/// Parse and validate a policies inventory.
///
/// Rule ids are assigned here, sequentially in document order, so a given
/// inventory always yields the same ids. Shape checks (uniqueness, target
/// globs, kind fields) happen here; rule-kind validation such as regex
/// compilation is the registry's validate pass.
pub fn parse_policies(text: &str) -> anyhow::Result<Inventory> {
    let file: PoliciesFileV1 = toml::from_str(text).context("parse policies file")?;
    build_inventory(file)
}

fn build_inventory(file: PoliciesFileV1) -> anyhow::Result<Inventory> {
    if let Some(schema) = &file.schema {
        anyhow::ensure!(
            schema == SCHEMA_POLICIES_V1,
            "unsupported policies schema '{schema}' (expected {SCHEMA_POLICIES_V1})"
        );
    }

    let mut inventory = Inventory::default();
    let mut policy_names = BTreeSet::new();
    let mut next_id = 1u64;

    for entry in file.policies {
        if !policy_names.insert(entry.name.clone()) {
            anyhow::bail!("duplicate policy name '{}'", entry.name);
        }
        for target in &entry.targets {
            Glob::new(target).with_context(|| {
                format!("policy '{}': invalid target glob '{target}'", entry.name)
            })?;
        }

        let mut rule_names = BTreeSet::new();
        let mut rules = Vec::with_capacity(entry.rules.len());
        for rule_entry in entry.rules {
            if !rule_names.insert(rule_entry.name.clone()) {
                anyhow::bail!(
                    "policy '{}': duplicate rule name '{}'",
                    entry.name,
                    rule_entry.name
                );
            }

            let id = RuleId::new(next_id);
            next_id += 1;

            let detail = rule_detail(&entry.name, &rule_entry)?;
            for exemption in &rule_entry.exemptions {
                inventory.exemptions.add(Exemption {
                    rule: id,
                    device: exemption.device.clone(),
                    expires: exemption.expires,
                });
            }
            rules.push(Rule {
                id,
                name: rule_entry.name,
                policy: entry.name.clone(),
                enabled: rule_entry.enabled,
                detail,
            });
        }

        inventory.policies.push(Policy {
            name: entry.name,
            targets: entry.targets,
            rules,
        });
    }

    Ok(inventory)
}

fn rule_detail(policy: &str, entry: &RuleEntryV1) -> anyhow::Result<RuleDetail> {
    match entry.kind.as_str() {
        ids::KIND_TEXT => {
            let field = entry.field.clone().ok_or_else(|| {
                anyhow::anyhow!("policy '{policy}': text rule '{}' needs 'field'", entry.name)
            })?;
            let pattern = entry.pattern.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "policy '{policy}': text rule '{}' needs 'pattern'",
                    entry.name
                )
            })?;
            Ok(RuleDetail::Text(TextRule {
                driver: entry.driver.clone(),
                field,
                context: entry.context.clone(),
                pattern,
                regex: entry.regex,
                invert: entry.invert,
                match_all: entry.match_all,
            }))
        }
        ids::KIND_JAVASCRIPT | ids::KIND_PYTHON => {
            let script = entry.script.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "policy '{policy}': script rule '{}' needs 'script'",
                    entry.name
                )
            })?;
            let script = ScriptRule { script };
            Ok(if entry.kind == ids::KIND_JAVASCRIPT {
                RuleDetail::JavaScript(script)
            } else {
                RuleDetail::Python(script)
            })
        }
        other => anyhow::bail!(
            "policy '{policy}': rule '{}' has unknown kind '{other}' (expected text|javascript|python)",
            entry.name
        ),
    }
}

pub fn load_devices(path: &Utf8Path) -> anyhow::Result<Vec<DeviceModel>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    let file = parse_devices(&text).with_context(|| format!("parse {path}"))?;
    let base = path.parent().unwrap_or(Utf8Path::new("."));
    materialize_devices(file, base)
}

/// Parse a devices inventory without touching the filesystem.
pub fn parse_devices(text: &str) -> anyhow::Result<DevicesFileV1> {
    let file: DevicesFileV1 = toml::from_str(text).context("parse devices file")?;
    if let Some(schema) = &file.schema {
        anyhow::ensure!(
            schema == SCHEMA_DEVICES_V1,
            "unsupported devices schema '{schema}' (expected {SCHEMA_DEVICES_V1})"
        );
    }
    Ok(file)
}

fn materialize_devices(file: DevicesFileV1, base: &Utf8Path) -> anyhow::Result<Vec<DeviceModel>> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for device in &file.devices {
        if !seen.insert(device.name.clone()) {
            anyhow::bail!("duplicate device name '{}'", device.name);
        }
        for key in device.files.keys() {
            if device.attributes.contains_key(key) {
                anyhow::bail!(
                    "device '{}': attribute '{key}' defined both inline and as a file",
                    device.name
                );
            }
        }
    }

    // Snapshots can be large (full running configs), so read them in parallel.
    file.devices
        .into_par_iter()
        .map(|entry| -> anyhow::Result<DeviceModel> {
            let mut attributes = entry.attributes;
            for (key, rel) in entry.files {
                let path = base.join(&rel);
                let content = std::fs::read_to_string(&path).with_context(|| {
                    format!("device '{}': read attribute '{key}' from {path}", entry.name)
                })?;
                attributes.insert(key, content);
            }
            Ok(DeviceModel {
                name: entry.name,
                driver: entry.driver,
                attributes,
            })
        })
        .collect()
}
