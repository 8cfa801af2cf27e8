use baseline_templates::{builtin_templates, password_policy_baseline};
use config_model::{DiffKind, Severity};
use drift_engine::{compare, parse_tree};
use security_rules::{score_breakdown, security_score, RuleEngine};
use serde_json::json;

fn tenant_snapshot() -> serde_json::Value {
    json!({
        "users": [
            {"primaryEmail": "admin@example.com", "isAdmin": true, "isEnforcedIn2Sv": true},
            {"primaryEmail": "user1@example.com", "isAdmin": false, "isEnforcedIn2Sv": false},
            {"primaryEmail": "user2@example.com", "isAdmin": false, "isEnforcedIn2Sv": true}
        ],
        "passwordLengthMin": 8,
        "passwordExpiration": 0,
        "drive": {"externalSharingEnabled": true},
        "mobile": [
            {
                "deviceId": "dev-1",
                "email": "user1@example.com",
                "encryptionStatus": "On",
                "deviceCompromisedStatus": "Undetected",
                "devicePasswordStatus": "Off"
            }
        ],
        "oauth_tokens": [
            {
                "displayText": "Mail Sync",
                "clientId": "123.apps.example",
                "userKey": "user1@example.com",
                "scopes": "https://mail.google.com/"
            }
        ],
        "admin_roles": []
    })
}

#[test]
fn test_end_to_end_snapshot_audit() {
    let snapshot = tenant_snapshot();

    let evaluation = RuleEngine::new().evaluate(&snapshot);
    assert!(evaluation.failures.is_empty());

    // One 2FA gap, weak length + no expiration, external sharing, one
    // passwordless device, one risky OAuth token.
    let titles: Vec<&str> = evaluation
        .findings
        .iter()
        .map(|f| f.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Two-Factor Authentication Not Enforced",
            "Weak Password Length Requirement",
            "No Password Expiration Policy",
            "External Sharing Enabled",
            "Mobile Device Without Password",
            "Third-Party App with Sensitive Permissions",
        ]
    );

    let breakdown = score_breakdown(&evaluation.findings);
    assert_eq!(breakdown.total_findings, 6);
    assert_eq!(breakdown.critical_findings, 1);
    assert_eq!(breakdown.high_findings, 3);
    assert_eq!(breakdown.medium_findings, 2);
    // 100 - 25 (oauth critical) - 3*15 (high) - 2*10 (medium)
    assert_eq!(breakdown.security_score, 10);
    assert_eq!(breakdown.security_score, security_score(&evaluation.findings));
}

#[test]
fn test_drift_between_two_snapshots() {
    let before = tenant_snapshot();
    let mut after = tenant_snapshot();
    after["drive"]["externalSharingEnabled"] = json!(false);
    after["passwordLengthMin"] = json!(14);
    after.as_object_mut().unwrap().remove("admin_roles");

    let report = compare(&before, &after);
    assert!(report.drift_detected);
    assert_eq!(report.differences.len(), 3);

    let by_path = |p: &str| {
        report
            .differences
            .iter()
            .find(|d| d.path == p)
            .unwrap_or_else(|| panic!("no difference at {p}"))
    };
    assert_eq!(by_path("admin_roles").kind, DiffKind::Removed);
    assert_eq!(
        by_path("drive.externalSharingEnabled").kind,
        DiffKind::Modified
    );
    assert_eq!(by_path("passwordLengthMin").kind, DiffKind::Modified);

    assert_eq!(
        report.summary,
        "Configuration drift detected: 1 setting(s) removed, 2 setting(s) modified. \
         Total differences: 3"
    );

    // Same snapshot twice: clean report.
    let clean = compare(&before, &before);
    assert!(!clean.drift_detected);
    assert!(clean.differences.is_empty());
}

#[test]
fn test_snapshot_against_password_baseline() {
    let baseline = password_policy_baseline();
    let snapshot = json!({
        "passwordLengthMin": 8,
        "passwordExpiration": 0,
        "passwordReuseAllowed": false
    });

    let report = compare(&snapshot, &baseline.data);
    assert!(report.drift_detected);

    let modified: Vec<&str> = report
        .differences
        .iter()
        .filter(|d| d.kind == DiffKind::Modified)
        .map(|d| d.path.as_str())
        .collect();
    assert_eq!(modified, vec!["passwordExpiration", "passwordLengthMin"]);

    // A compliant snapshot shows no drift against the baseline.
    let compliant = compare(&baseline.data, &baseline.data);
    assert!(!compliant.drift_detected);
}

#[test]
fn test_baseline_fixes_resolve_findings() {
    // Apply every baseline's settings on top of a weak snapshot and verify
    // the corresponding findings disappear.
    let weak = json!({
        "passwordLengthMin": 8,
        "passwordExpiration": 0,
        "drive": {"externalSharingEnabled": true}
    });
    let engine = RuleEngine::new();
    let weak_eval = engine.evaluate(&weak);
    assert_eq!(weak_eval.findings.len(), 3);

    let hardened = json!({
        "passwordLengthMin": 12,
        "passwordExpiration": 90,
        "drive": {"externalSharingEnabled": false}
    });
    let hardened_eval = engine.evaluate(&hardened);
    assert!(hardened_eval.findings.is_empty());
    assert_eq!(security_score(&hardened_eval.findings), 100);

    assert_eq!(builtin_templates().len(), 3);
}

#[test]
fn test_snapshot_files_roundtrip_through_parse_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, serde_json::to_string(&tenant_snapshot()).unwrap()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let tree = parse_tree(&raw).unwrap();
    assert_eq!(tree, tenant_snapshot());

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{broken").unwrap();
    let raw = std::fs::read_to_string(&bad).unwrap();
    assert!(parse_tree(&raw).is_err());

    // Findings are severity-tagged the same whether the tree came from a
    // file or was built in memory.
    let evaluation = RuleEngine::new().evaluate(&tree);
    assert!(evaluation
        .findings
        .iter()
        .any(|f| f.severity == Severity::Critical));
}
