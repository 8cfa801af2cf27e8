//! Rule bodies for the builtin security battery.
//!
//! Every check conforms to the same contract: inspect one configuration tree
//! and return partial findings. Severity and category are stamped by the
//! engine from the rule table, never here.

use serde_json::{json, Map, Value};

use crate::{RuleError, RuleOutput, RuleResult};

/// OAuth scopes that grant broad access to mail, files, or directory data.
const HIGH_RISK_SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/drive",
    "https://mail.google.com/",
    "https://www.googleapis.com/auth/admin.directory",
    "https://www.googleapis.com/auth/gmail.modify",
];

/// Loose truthiness matching the stored-snapshot conventions: null, false,
/// zero, empty string, and empty containers are falsy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn field_truthy(record: &Map<String, Value>, key: &str) -> bool {
    record.get(key).map(truthy).unwrap_or(false)
}

fn str_field<'a>(record: &'a Map<String, Value>, key: &str, default: &'a str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Flag every user record that does not have 2-step verification enforced.
pub fn two_factor_auth(config: &Value) -> RuleResult<Vec<RuleOutput>> {
    let mut findings = Vec::new();
    let Some(obj) = config.as_object() else {
        return Ok(findings);
    };

    let users: Vec<&Value> = match obj.get("users") {
        Some(Value::Array(users)) => users.iter().collect(),
        Some(other) => {
            return Err(RuleError::Shape(format!(
                "users is not an array: {other}"
            )))
        }
        // A single-user snapshot stores the record under "user".
        None => obj.get("user").into_iter().collect(),
    };

    for user in users {
        let Some(user) = user.as_object() else {
            continue;
        };
        if field_truthy(user, "isEnforcedIn2Sv") {
            continue;
        }

        let email = str_field(user, "primaryEmail", "unknown");
        let mut affected = Map::new();
        affected.insert(
            "user".to_string(),
            user.get("primaryEmail").cloned().unwrap_or(Value::Null),
        );

        findings.push(RuleOutput {
            title: "Two-Factor Authentication Not Enforced".to_string(),
            description: format!("User {email} does not have 2FA enforced"),
            recommendation: "Enable 2FA enforcement for all users to improve account security"
                .to_string(),
            affected_settings: affected,
            remediation_steps: vec![
                "Go to Admin Console > Security > 2-Step Verification".to_string(),
                "Select 'Enforce 2-Step Verification'".to_string(),
                "Set appropriate enforcement date".to_string(),
            ],
        });
    }

    Ok(findings)
}

/// Flag weak minimum password length and missing expiration policy.
///
/// An absent `passwordLengthMin` counts as the directory default of 8 and an
/// absent `passwordExpiration` counts as 0, so both checks fire on snapshots
/// that never configured these settings.
pub fn password_policy(config: &Value) -> RuleResult<Vec<RuleOutput>> {
    let mut findings = Vec::new();

    let min_length = match config.get("passwordLengthMin") {
        None => 8,
        Some(v) => v.as_i64().ok_or_else(|| {
            RuleError::Shape(format!("passwordLengthMin is not an integer: {v}"))
        })?,
    };

    if min_length < 12 {
        let mut affected = Map::new();
        affected.insert("passwordLengthMin".to_string(), json!(min_length));
        findings.push(RuleOutput {
            title: "Weak Password Length Requirement".to_string(),
            description: format!("Minimum password length is set to {min_length} characters"),
            recommendation: "Set minimum password length to at least 12 characters".to_string(),
            affected_settings: affected,
            remediation_steps: vec![
                "Go to Admin Console > Security > Password management".to_string(),
                "Set minimum password length to 12 or more characters".to_string(),
            ],
        });
    }

    let never_expires = match config.get("passwordExpiration") {
        None => true,
        Some(v) => matches!(v.as_f64(), Some(f) if f == 0.0),
    };

    if never_expires {
        let mut affected = Map::new();
        affected.insert("passwordExpiration".to_string(), json!(0));
        findings.push(RuleOutput {
            title: "No Password Expiration Policy".to_string(),
            description: "Passwords are set to never expire".to_string(),
            recommendation: "Consider implementing password expiration (e.g., 90 days) or use \
                             strong alternative controls"
                .to_string(),
            affected_settings: affected,
            remediation_steps: vec![
                "Go to Admin Console > Security > Password management".to_string(),
                "Set password expiration policy (recommended: 90 days)".to_string(),
                "Alternatively, ensure strong 2FA enforcement is in place".to_string(),
            ],
        });
    }

    Ok(findings)
}

/// Flag Drive configurations that allow sharing with external users.
///
/// `externalSharingEnabled` defaults to true when absent, matching the
/// product default.
pub fn external_sharing(config: &Value) -> RuleResult<Vec<RuleOutput>> {
    let mut findings = Vec::new();

    let Some(drive) = config.get("drive") else {
        return Ok(findings);
    };
    let drive = drive
        .as_object()
        .ok_or_else(|| RuleError::Shape(format!("drive is not an object: {drive}")))?;

    let enabled = drive
        .get("externalSharingEnabled")
        .map(truthy)
        .unwrap_or(true);

    if enabled {
        let mut affected = Map::new();
        affected.insert("externalSharingEnabled".to_string(), json!(true));
        findings.push(RuleOutput {
            title: "External Sharing Enabled".to_string(),
            description: "Drive allows sharing files with external users".to_string(),
            recommendation: "Review and restrict external sharing permissions if not required"
                .to_string(),
            affected_settings: affected,
            remediation_steps: vec![
                "Go to Admin Console > Apps > Google Workspace > Drive and Docs".to_string(),
                "Review sharing settings".to_string(),
                "Restrict external sharing if not needed for business operations".to_string(),
            ],
        });
    }

    Ok(findings)
}

/// Flag tenants with more than three super admin accounts.
pub fn admin_role_count(config: &Value) -> RuleResult<Vec<RuleOutput>> {
    let mut findings = Vec::new();

    let Some(Value::Array(users)) = config.get("users") else {
        return Ok(findings);
    };

    let super_admins = users
        .iter()
        .filter_map(Value::as_object)
        .filter(|u| field_truthy(u, "isAdmin"))
        .count();

    if super_admins > 3 {
        let mut affected = Map::new();
        affected.insert("superAdminCount".to_string(), json!(super_admins));
        findings.push(RuleOutput {
            title: "Excessive Super Admin Assignments".to_string(),
            description: format!("Found {super_admins} super admin accounts"),
            recommendation: "Limit super admin access to minimum necessary personnel".to_string(),
            affected_settings: affected,
            remediation_steps: vec![
                "Review all super admin accounts".to_string(),
                "Remove unnecessary super admin privileges".to_string(),
                "Use delegated admin roles where possible".to_string(),
            ],
        });
    }

    Ok(findings)
}

/// Flag mobile devices that are unencrypted, compromised, or passwordless.
/// Each device can emit up to three findings.
pub fn mobile_device_security(config: &Value) -> RuleResult<Vec<RuleOutput>> {
    let mut findings = Vec::new();

    let Some(Value::Array(devices)) = config.get("mobile") else {
        return Ok(findings);
    };

    for device in devices {
        let Some(device) = device.as_object() else {
            continue;
        };

        let device_id = str_field(device, "deviceId", "Unknown");
        let user_email = str_field(device, "email", "Unknown");

        let base_affected = || {
            let mut m = Map::new();
            m.insert("device".to_string(), json!(device_id));
            m.insert("user".to_string(), json!(user_email));
            m
        };

        if device.get("encryptionStatus").and_then(Value::as_str) != Some("On") {
            findings.push(RuleOutput {
                title: "Unencrypted Mobile Device Detected".to_string(),
                description: format!(
                    "Device {device_id} for user {user_email} is not encrypted"
                ),
                recommendation: "Require device encryption for all mobile devices accessing \
                                 corporate data"
                    .to_string(),
                affected_settings: base_affected(),
                remediation_steps: vec![
                    "Contact user to enable device encryption".to_string(),
                    "Enforce encryption policy in Mobile Device Management".to_string(),
                    "Consider blocking unencrypted devices".to_string(),
                ],
            });
        }

        // A missing status is treated as suspicious, not as clean.
        let compromised_status = device.get("deviceCompromisedStatus").and_then(Value::as_str);
        let clean = matches!(
            compromised_status,
            Some("Undetected") | Some("No compromise detected") | Some("")
        );
        if !clean {
            let mut affected = base_affected();
            affected.insert(
                "status".to_string(),
                device
                    .get("deviceCompromisedStatus")
                    .cloned()
                    .unwrap_or(Value::Null),
            );
            findings.push(RuleOutput {
                title: "Compromised Mobile Device Detected".to_string(),
                description: format!(
                    "Device {device_id} for user {user_email} shows signs of compromise"
                ),
                recommendation: "Immediately investigate and potentially wipe the device"
                    .to_string(),
                affected_settings: affected,
                remediation_steps: vec![
                    "Immediately contact the user".to_string(),
                    "Revoke device access".to_string(),
                    "Perform security assessment".to_string(),
                    "Remote wipe if necessary".to_string(),
                ],
            });
        }

        if device.get("devicePasswordStatus").and_then(Value::as_str) != Some("On") {
            findings.push(RuleOutput {
                title: "Mobile Device Without Password".to_string(),
                description: format!(
                    "Device {device_id} for user {user_email} does not have a password set"
                ),
                recommendation: "Require device passwords/PINs for all mobile devices".to_string(),
                affected_settings: base_affected(),
                remediation_steps: vec![
                    "Enable password policy in Mobile Device Management".to_string(),
                    "Require minimum password complexity".to_string(),
                    "Set password expiration if needed".to_string(),
                ],
            });
        }
    }

    Ok(findings)
}

/// Flag OAuth tokens holding high-risk scopes, plus an aggregate finding when
/// too many third-party apps have access at all.
pub fn oauth_token_security(config: &Value) -> RuleResult<Vec<RuleOutput>> {
    let mut findings = Vec::new();

    let Some(Value::Array(tokens)) = config.get("oauth_tokens") else {
        return Ok(findings);
    };

    for token in tokens {
        let Some(token) = token.as_object() else {
            continue;
        };

        let display_text = str_field(token, "displayText", "Unknown App");
        let client_id = str_field(token, "clientId", "Unknown");
        let user_key = str_field(token, "userKey", "Unknown");

        // Scopes may be stored as one space-joined string or as an array.
        let has_high_risk = match token.get("scopes") {
            Some(Value::String(scopes)) => {
                HIGH_RISK_SCOPES.iter().any(|risk| scopes.contains(risk))
            }
            Some(Value::Array(scopes)) => scopes
                .iter()
                .filter_map(Value::as_str)
                .any(|s| HIGH_RISK_SCOPES.contains(&s)),
            _ => false,
        };

        if has_high_risk {
            let mut affected = Map::new();
            affected.insert("app".to_string(), json!(display_text));
            affected.insert("user".to_string(), json!(user_key));
            affected.insert("client_id".to_string(), json!(client_id));
            findings.push(RuleOutput {
                title: "Third-Party App with Sensitive Permissions".to_string(),
                description: format!(
                    "App '{display_text}' has access to sensitive data for user {user_key}"
                ),
                recommendation: "Review and revoke access for unnecessary third-party \
                                 applications"
                    .to_string(),
                affected_settings: affected,
                remediation_steps: vec![
                    "Review the app's necessity".to_string(),
                    "Check if app is from trusted vendor".to_string(),
                    "Revoke if not needed: Go to Admin Console > Security > API controls"
                        .to_string(),
                    "Consider using approved apps list".to_string(),
                ],
            });
        }
    }

    if tokens.len() > 10 {
        let mut affected = Map::new();
        affected.insert("total_apps".to_string(), json!(tokens.len()));
        findings.push(RuleOutput {
            title: "Excessive Third-Party App Access".to_string(),
            description: format!(
                "Found {} third-party apps with OAuth access",
                tokens.len()
            ),
            recommendation: "Audit and limit third-party app access to necessary applications \
                             only"
                .to_string(),
            affected_settings: affected,
            remediation_steps: vec![
                "Review all authorized applications".to_string(),
                "Revoke unused or unnecessary apps".to_string(),
                "Implement app approval workflow".to_string(),
                "Enable API access controls".to_string(),
            ],
        });
    }

    Ok(findings)
}

/// Flag custom admin roles whose privilege blob is suspiciously large.
pub fn admin_role_assignment(config: &Value) -> RuleResult<Vec<RuleOutput>> {
    let mut findings = Vec::new();

    let Some(Value::Array(roles)) = config.get("admin_roles") else {
        return Ok(findings);
    };

    for role in roles {
        let Some(role) = role.as_object() else {
            continue;
        };

        let role_name = str_field(role, "roleName", "Unknown");
        let privileges = role.get("rolePrivileges").and_then(Value::as_str);

        if privileges.map(|p| p.len() > 1000).unwrap_or(false) {
            let mut affected = Map::new();
            affected.insert("role".to_string(), json!(role_name));
            findings.push(RuleOutput {
                title: "Overly Broad Admin Role".to_string(),
                description: format!("Admin role '{role_name}' has extensive privileges"),
                recommendation: "Follow least privilege principle - limit admin role permissions \
                                 to only what's necessary"
                    .to_string(),
                affected_settings: affected,
                remediation_steps: vec![
                    "Review the role's privileges".to_string(),
                    "Remove unnecessary permissions".to_string(),
                    "Split into multiple focused roles if needed".to_string(),
                    "Audit who has this role assigned".to_string(),
                ],
            });
        }
    }

    Ok(findings)
}
