use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Schema string for tooling.
pub const SCHEMA_CONFIG_V1: &str = "confguard.config.v1";

/// `confguard.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfguardConfigV1 {
    /// Optional schema string for tooling (`confguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// When to fail the run: `non-conforming` (default), `error`, or `never`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<String>,

    /// Evaluation worker pool size; 0 or absent picks a sensible default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Per-rule evaluation budget in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_timeout_ms: Option<u64>,

    /// Path to the policies inventory file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<String>,

    /// Path to the devices inventory file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<String>,
}
