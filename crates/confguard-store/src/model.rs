use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Schema strings for tooling.
pub const SCHEMA_POLICIES_V1: &str = "confguard.policies.v1";
pub const SCHEMA_DEVICES_V1: &str = "confguard.devices.v1";

/// `policies.toml` schema v1.
///
/// User-facing inventory model: rule kinds are flattened into optional
/// fields rather than nested tables, so a rule stays one TOML block. The
/// loader turns this into the typed domain model and reports shape errors
/// with policy and rule names attached.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PoliciesFileV1 {
    /// Optional schema string for tooling (`confguard.policies.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, rename = "policy")]
    pub policies: Vec<PolicyEntryV1>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyEntryV1 {
    pub name: String,

    /// Device-name globs; empty applies the policy to every device.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntryV1>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleEntryV1 {
    pub name: String,

    /// `text`, `javascript`, or `python`.
    pub kind: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    // Text-kind fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub regex: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invert: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub match_all: bool,

    // Script-kind field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, rename = "exemption")]
    pub exemptions: Vec<ExemptionEntryV1>,
}

impl Default for RuleEntryV1 {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: String::new(),
            enabled: true,
            driver: None,
            field: None,
            context: None,
            pattern: None,
            regex: false,
            invert: false,
            match_all: false,
            script: None,
            exemptions: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExemptionEntryV1 {
    pub device: String,

    /// RFC 3339 timestamp, e.g. `"2026-12-31T00:00:00Z"`; absent means
    /// the exemption never lapses.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub expires: Option<OffsetDateTime>,
}

/// `devices.toml` schema v1.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DevicesFileV1 {
    /// Optional schema string for tooling (`confguard.devices.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceEntryV1>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeviceEntryV1 {
    pub name: String,
    pub driver: String,

    /// Inline attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Attribute values loaded from files, resolved relative to the
    /// inventory file's directory.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, String>,
}
