//! Built-in best-practice configuration baselines.
//!
//! Each baseline is a fixed snapshot of recommended settings. Comparing a
//! live snapshot against a baseline with the drift engine surfaces every
//! deviation from best practice.

use config_model::ConfigType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Metadata for a baseline template to enable deterministic referencing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub id: String,
    pub version: String,
    pub hash: String,
    pub created_at: u64,
}

/// A best-practice baseline snapshot with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub metadata: TemplateMetadata,
    pub config_type: ConfigType,
    pub data: Value,
}

impl Template {
    pub fn new(id: &str, version: &str, config_type: ConfigType, data: Value) -> Self {
        let hash = compute_template_hash(&data).unwrap_or_default();
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            metadata: TemplateMetadata {
                id: id.to_string(),
                version: version.to_string(),
                hash,
                created_at,
            },
            config_type,
            data,
        }
    }
}

fn compute_template_hash(data: &Value) -> Result<String, serde_json::Error> {
    use sha2::{Digest, Sha256};

    let json = serde_json::to_string(data)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Recommended password management settings.
pub fn password_policy_baseline() -> Template {
    Template::new(
        "PASSWORD_POLICY_BASELINE",
        "1.0.0",
        ConfigType::Security,
        json!({
            "passwordLengthMin": 12,
            "passwordExpiration": 90,
            "passwordReuseAllowed": false
        }),
    )
}

/// Recommended Drive sharing settings.
pub fn drive_sharing_baseline() -> Template {
    Template::new(
        "DRIVE_SHARING_BASELINE",
        "1.0.0",
        ConfigType::Drive,
        json!({
            "drive": {
                "externalSharingEnabled": false,
                "linkSharingDefault": "off",
                "warnOnExternalShare": true
            }
        }),
    )
}

/// Recommended mobile device management settings.
pub fn mobile_management_baseline() -> Template {
    Template::new(
        "MOBILE_MANAGEMENT_BASELINE",
        "1.0.0",
        ConfigType::Mobile,
        json!({
            "requireEncryption": true,
            "requireDevicePassword": true,
            "blockCompromisedDevices": true
        }),
    )
}

/// All built-in baselines.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        password_policy_baseline(),
        drive_sharing_baseline(),
        mobile_management_baseline(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_have_unique_ids() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), 3);
        let mut ids: Vec<&str> = templates.iter().map(|t| t.metadata.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn template_hash_depends_only_on_the_data() {
        let a = password_policy_baseline();
        let b = password_policy_baseline();
        assert_eq!(a.metadata.hash, b.metadata.hash);
        assert_eq!(a.metadata.hash.len(), 64);

        let other = drive_sharing_baseline();
        assert_ne!(a.metadata.hash, other.metadata.hash);
    }

    #[test]
    fn password_baseline_meets_its_own_policy() {
        let data = password_policy_baseline().data;
        assert_eq!(data["passwordLengthMin"], 12);
        assert_eq!(data["passwordExpiration"], 90);
    }
}
