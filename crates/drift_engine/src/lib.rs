use std::collections::BTreeSet;

use config_model::{DiffKind, Difference, DriftReport};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriftError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, DriftError>;

/// Parse a raw JSON snapshot, failing fast on malformed input.
pub fn parse_tree(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| DriftError::InvalidInput(e.to_string()))
}

/// Compare two configuration snapshots and produce a drift report.
///
/// Objects are recursed key by key over the union of their keys (sorted, so
/// output order is deterministic). Arrays are compared whole: any inequality
/// is reported as a single `modified` entry carrying both full values, never
/// element by element. A node that is an object on one side only is not
/// descended into; it falls to the leaf comparison as one `modified` entry.
/// Neither input is mutated.
pub fn compare(source: &Value, target: &Value) -> DriftReport {
    let mut differences = Vec::new();
    match (source, target) {
        (Value::Object(s), Value::Object(t)) => compare_objects(s, t, "", &mut differences),
        _ => compare_leaf(source, target, "", &mut differences),
    }
    let drift_detected = !differences.is_empty();
    let summary = generate_summary(&differences);
    DriftReport {
        differences,
        drift_detected,
        summary,
    }
}

fn compare_objects(
    source: &Map<String, Value>,
    target: &Map<String, Value>,
    path: &str,
    out: &mut Vec<Difference>,
) {
    let keys: BTreeSet<&str> = source
        .keys()
        .chain(target.keys())
        .map(String::as_str)
        .collect();

    for key in keys {
        let current_path = if path.is_empty() {
            key.to_string()
        } else {
            format!("{path}.{key}")
        };

        match (source.get(key), target.get(key)) {
            // Key only in source
            (Some(sv), None) => out.push(difference(
                current_path,
                DiffKind::Removed,
                sv.clone(),
                Value::Null,
            )),
            // Key only in target
            (None, Some(tv)) => out.push(difference(
                current_path,
                DiffKind::Added,
                Value::Null,
                tv.clone(),
            )),
            // Both objects: recurse
            (Some(Value::Object(s)), Some(Value::Object(t))) => {
                compare_objects(s, t, &current_path, out)
            }
            // Arrays, scalars, or mixed types
            (Some(sv), Some(tv)) => compare_leaf(sv, tv, &current_path, out),
            (None, None) => {}
        }
    }
}

fn compare_leaf(source: &Value, target: &Value, path: &str, out: &mut Vec<Difference>) {
    if source != target {
        out.push(difference(
            path.to_string(),
            DiffKind::Modified,
            source.clone(),
            target.clone(),
        ));
    }
}

fn difference(path: String, kind: DiffKind, source_value: Value, target_value: Value) -> Difference {
    Difference {
        path,
        kind,
        source_value,
        target_value,
        severity: kind.default_severity(),
    }
}

/// Generate a human-readable summary of a difference list.
pub fn generate_summary(differences: &[Difference]) -> String {
    if differences.is_empty() {
        return "No differences found. Configurations are identical.".to_string();
    }

    let count = |kind: DiffKind| differences.iter().filter(|d| d.kind == kind).count();
    let added = count(DiffKind::Added);
    let removed = count(DiffKind::Removed);
    let modified = count(DiffKind::Modified);

    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("{added} setting(s) added"));
    }
    if removed > 0 {
        parts.push(format!("{removed} setting(s) removed"));
    }
    if modified > 0 {
        parts.push(format!("{modified} setting(s) modified"));
    }

    format!(
        "Configuration drift detected: {}. Total differences: {}",
        parts.join(", "),
        differences.len()
    )
}
