//! Security rule battery for Google Workspace configuration snapshots.
//!
//! A fixed, ordered table of independent rules is run over one configuration
//! tree. Each rule is a pure function returning partial findings; the engine
//! stamps the rule's fixed severity and category onto every finding and
//! isolates per-rule failures so one broken rule never aborts the batch.

use config_model::{Finding, ScoreBreakdown, Severity};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod checks;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unexpected shape: {0}")]
    Shape(String),
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;

/// Partial finding produced by a rule body. The engine fills in severity and
/// category from the rule definition.
#[derive(Debug, Clone)]
pub struct RuleOutput {
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub affected_settings: Map<String, Value>,
    pub remediation_steps: Vec<String>,
}

pub type RuleFn = fn(&Value) -> RuleResult<Vec<RuleOutput>>;

/// One entry in the rule table: fixed metadata plus the check function.
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    pub name: &'static str,
    pub severity: Severity,
    pub category: &'static str,
    pub check: RuleFn,
}

/// Diagnostic for a rule that failed during evaluation. Failures degrade that
/// rule's contribution to zero findings; they are never hard errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub rule: &'static str,
    pub error: String,
}

/// Findings plus per-rule failure diagnostics from one evaluation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evaluation {
    pub findings: Vec<Finding>,
    pub failures: Vec<RuleFailure>,
}

/// The builtin battery, in fixed execution order. New rules are added by
/// implementing the `RuleFn` contract and appending here.
pub fn builtin_rules() -> Vec<RuleDef> {
    vec![
        RuleDef {
            name: "two_factor_auth",
            severity: Severity::High,
            category: "Authentication",
            check: checks::two_factor_auth,
        },
        RuleDef {
            name: "password_policy",
            severity: Severity::Medium,
            category: "Authentication",
            check: checks::password_policy,
        },
        RuleDef {
            name: "external_sharing",
            severity: Severity::High,
            category: "Data Protection",
            check: checks::external_sharing,
        },
        RuleDef {
            name: "admin_role_count",
            severity: Severity::Critical,
            category: "Access Control",
            check: checks::admin_role_count,
        },
        RuleDef {
            name: "mobile_device_security",
            severity: Severity::High,
            category: "Mobile Security",
            check: checks::mobile_device_security,
        },
        RuleDef {
            name: "oauth_token_security",
            severity: Severity::Critical,
            category: "Third-Party Access",
            check: checks::oauth_token_security,
        },
        RuleDef {
            name: "admin_role_assignment",
            severity: Severity::High,
            category: "Access Control",
            check: checks::admin_role_assignment,
        },
    ]
}

/// Stateless rule dispatcher.
pub struct RuleEngine {
    rules: Vec<RuleDef>,
}

impl RuleEngine {
    /// Engine loaded with the builtin battery.
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// Engine with a custom rule table (used for extension and for fault
    /// injection in tests).
    pub fn with_rules(rules: Vec<RuleDef>) -> Self {
        Self { rules }
    }

    /// Run every rule over `config` in registration order, concatenating the
    /// findings. A failing rule is logged, recorded as a diagnostic, and
    /// skipped; the remaining rules still run.
    pub fn evaluate(&self, config: &Value) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for rule in &self.rules {
            match (rule.check)(config) {
                Ok(outputs) => {
                    for output in outputs {
                        evaluation.findings.push(Finding {
                            severity: rule.severity,
                            category: rule.category.to_string(),
                            title: output.title,
                            description: output.description,
                            recommendation: output.recommendation,
                            affected_settings: output.affected_settings,
                            remediation_steps: output.remediation_steps,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(rule = rule.name, error = %e, "security rule failed, skipping");
                    evaluation.failures.push(RuleFailure {
                        rule: rule.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        evaluation
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Security score in [0, 100]: start at 100, subtract each finding's fixed
/// severity weight, floor at 0.
pub fn security_score(findings: &[Finding]) -> u32 {
    let deduction: u32 = findings.iter().map(|f| f.severity.weight()).sum();
    100u32.saturating_sub(deduction)
}

/// Score plus per-severity finding counts, the shape stored alongside
/// analysis reports.
pub fn score_breakdown(findings: &[Finding]) -> ScoreBreakdown {
    let count = |s: Severity| findings.iter().filter(|f| f.severity == s).count();
    ScoreBreakdown {
        security_score: security_score(findings),
        total_findings: findings.len(),
        critical_findings: count(Severity::Critical),
        high_findings: count(Severity::High),
        medium_findings: count(Severity::Medium),
        low_findings: count(Severity::Low),
    }
}
