use confguard_types::RuleId;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Administrative override: one device excused from one rule, optionally
/// until an expiry instant.
///
/// Created and removed by the persistence layer; the evaluation core only
/// reads these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exemption {
    pub rule: RuleId,
    pub device: String,
    pub expires: Option<OffsetDateTime>,
}

impl Exemption {
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        match self.expires {
            None => true,
            Some(expiry) => now < expiry,
        }
    }
}

/// All exemptions loaded for a run, keyed by (rule, device).
///
/// Lookup is synchronous against already-loaded state. The mutation
/// methods are the explicit lifecycle the persistence layer drives;
/// nothing here runs during evaluation.
#[derive(Clone, Debug, Default)]
pub struct ExemptionSet {
    by_rule: BTreeMap<RuleId, BTreeMap<String, Option<OffsetDateTime>>>,
}

impl ExemptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff an exemption exists for the pair and any expiry has not
    /// passed at the evaluation instant.
    pub fn is_exempted(&self, rule: RuleId, device: &str, now: OffsetDateTime) -> bool {
        let Some(devices) = self.by_rule.get(&rule) else {
            return false;
        };
        match devices.get(device) {
            Some(None) => true,
            Some(Some(expiry)) => now < *expiry,
            None => false,
        }
    }

    /// Insert an exemption; for a duplicate (rule, device) pair the last
    /// write wins.
    pub fn add(&mut self, exemption: Exemption) {
        self.by_rule
            .entry(exemption.rule)
            .or_default()
            .insert(exemption.device, exemption.expires);
    }

    pub fn remove(&mut self, rule: RuleId, device: &str) -> bool {
        let Some(devices) = self.by_rule.get_mut(&rule) else {
            return false;
        };
        let removed = devices.remove(device).is_some();
        if devices.is_empty() {
            self.by_rule.remove(&rule);
        }
        removed
    }

    /// Detach every exemption owned by a rule. Invoked by the persistence
    /// layer when the rule itself is deleted, never during evaluation.
    pub fn clear_rule(&mut self, rule: RuleId) {
        self.by_rule.remove(&rule);
    }

    pub fn len(&self) -> usize {
        self.by_rule.values().map(|devices| devices.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_rule.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Exemption> + '_ {
        self.by_rule.iter().flat_map(|(rule, devices)| {
            devices.iter().map(|(device, expires)| Exemption {
                rule: *rule,
                device: device.clone(),
                expires: *expires,
            })
        })
    }
}
