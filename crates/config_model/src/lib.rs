use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kinds of Google Workspace configuration snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    User,
    Group,
    OrganizationalUnit,
    Domain,
    Calendar,
    Drive,
    Gmail,
    Security,
    Mobile,
    OauthTokens,
    AdminRoles,
    SharedDrives,
    #[serde(other)]
    Other,
}

/// Security severity levels, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Fixed score deduction applied per finding of this severity.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 25,
            Severity::High => 15,
            Severity::Medium => 10,
            Severity::Low => 5,
            Severity::Info => 2,
        }
    }
}

/// Classification of a single configuration difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Added,
    Removed,
    Modified,
}

impl DiffKind {
    /// Default severity tag assigned to a difference of this kind.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiffKind::Added => Severity::Low,
            DiffKind::Removed => Severity::Medium,
            DiffKind::Modified => Severity::Medium,
        }
    }
}

/// One entry in a drift report.
///
/// `path` is the dotted location of the differing node: root keys are
/// unqualified, nested keys are joined with `.`. Literal dots inside keys are
/// not escaped, so such a key is indistinguishable from a nesting level.
/// Stored reports depend on this format; do not change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: DiffKind,
    pub source_value: Value,
    pub target_value: Value,
    pub severity: Severity,
}

/// Result of comparing two configuration snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub differences: Vec<Difference>,
    pub drift_detected: bool,
    pub summary: String,
}

/// One security issue surfaced by a rule.
///
/// Severity and category are fixed per rule; the rule body never sets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    #[serde(default)]
    pub affected_settings: Map<String, Value>,
    #[serde(default)]
    pub remediation_steps: Vec<String>,
}

/// Aggregate security score plus per-severity finding counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub security_score: u32,
    pub total_findings: usize,
    pub critical_findings: usize,
    pub high_findings: usize,
    pub medium_findings: usize,
    pub low_findings: usize,
}
