//! Human-readable one-line summaries for audit events

use serde_json::Value;

use super::diff::{ChangeSet, MetadataFields};

pub fn created(entity_type: &str) -> String {
    format!("{} created", entity_type)
}

pub fn deleted(entity_type: &str) -> String {
    format!("{} deleted", entity_type)
}

/// Summarize an update
///
/// Metadata fields never appear in the list; an update that touched only
/// metadata says so explicitly.
pub fn updated(entity_type: &str, changes: &ChangeSet, metadata: &MetadataFields) -> String {
    if changes.is_empty() {
        return format!("{} updated - no changes detected", entity_type);
    }

    let parts: Vec<String> = changes
        .business_changes(metadata)
        .map(|c| {
            format!(
                "{} (from '{}' to '{}')",
                c.field_name,
                render(&c.old_value),
                render(&c.new_value)
            )
        })
        .collect();

    if parts.is_empty() {
        format!("{} updated - metadata only", entity_type)
    } else {
        format!("{} updated: {}", entity_type, parts.join(", "))
    }
}

/// Render a value for a summary: strings unquoted, null as `null`
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
