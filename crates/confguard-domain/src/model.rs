use confguard_types::{RuleId, ids};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Read-only snapshot of one managed device.
///
/// Attributes are named pieces of captured state (`running-config`,
/// `startup-config`, inventory facts). The evaluation core never fetches
/// anything; whatever a rule needs must already be in here.
#[derive(Clone, Debug, Default)]
pub struct DeviceModel {
    pub name: String,
    /// Platform identifier (`ios`, `junos`, ...); text rules may scope
    /// themselves to one driver.
    pub driver: String,
    pub attributes: BTreeMap<String, String>,
}

impl DeviceModel {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }
}

/// A named, ordered group of rules scoped to a device selection.
///
/// Rule order is document order and is the report order, so runs are
/// comparable run-to-run.
#[derive(Clone, Debug, Default)]
pub struct Policy {
    pub name: String,
    /// Device-name globs; empty means every device.
    pub targets: Vec<String>,
    pub rules: Vec<Rule>,
}

/// One named constraint a device should satisfy.
///
/// Identity (`id`) is assigned by the persistence layer and is what
/// equality, hashing, and exemption lookups key on. `policy` is a
/// back-reference to the owning policy by name; the `Policy` owns the
/// rules vector.
#[derive(Clone, Debug)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub policy: String,
    pub enabled: bool,
    pub detail: RuleDetail,
}

impl Rule {
    pub fn kind_tag(&self) -> &'static str {
        self.detail.kind_tag()
    }
}

// Equality is (id, concrete kind); hashing is id only. Rules serve as keys
// in exemption lookups and per-run dedup sets, so both must ignore the
// mutable fields (name, enabled).
impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.detail.kind_tag() == other.detail.kind_tag()
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "compliance rule {} (name '{}')", self.id, self.name)
    }
}

/// Kind-specific rule definition.
///
/// A closed union rather than an open trait: the set of storable kinds is
/// a data-format decision, while the set of *evaluatable* kinds is the
/// registry's (a stored script kind without a registered sandbox simply
/// evaluates to not_applicable).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleDetail {
    Text(TextRule),
    JavaScript(ScriptRule),
    Python(ScriptRule),
}

impl RuleDetail {
    pub fn kind_tag(&self) -> &'static str {
        match self {
            RuleDetail::Text(_) => ids::KIND_TEXT,
            RuleDetail::JavaScript(_) => ids::KIND_JAVASCRIPT,
            RuleDetail::Python(_) => ids::KIND_PYTHON,
        }
    }
}

/// Pattern-driven rule over one device attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextRule {
    /// Restrict to one driver; `None` applies to every platform.
    pub driver: Option<String>,
    /// Device attribute to inspect, e.g. `running-config`.
    pub field: String,
    /// Regex selecting configuration sections: a matching line plus its
    /// more-indented continuation lines. `None` treats the whole attribute
    /// as one section.
    pub context: Option<String>,
    pub pattern: String,
    /// Interpret `pattern` as a regex instead of a plain substring.
    pub regex: bool,
    /// Conformance means the pattern is *absent*.
    pub invert: bool,
    /// With a context: every section must match. Default: at least one.
    pub match_all: bool,
}

/// Script-driven rule; the interpreter lives behind a sandbox collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptRule {
    pub script: String,
}

/// Compiled device selection for a policy. `Ok(None)` matches every
/// device. The store rejects bad globs at load time, but a `Policy` built
/// directly can still carry one, so this surfaces the error instead of
/// panicking.
pub fn build_target_set(targets: &[String]) -> Result<Option<GlobSet>, globset::Error> {
    if targets.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in targets {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

pub fn target_matches(targets: Option<&GlobSet>, device: &str) -> bool {
    targets.map(|set| set.is_match(device)).unwrap_or(true)
}
