//! Audit event display formatting
//!
//! Formats events and history timelines for terminal output.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::{AuditEvent, FieldChange, HistoryEntry};

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Ver")]
    version: i32,
    #[tabled(rename = "By")]
    initiator: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

/// Format a list of events as a table
pub fn format_event_table(events: &[AuditEvent]) -> String {
    if events.is_empty() {
        return "No audit events found.".to_string();
    }

    let rows = events.iter().map(|e| EventRow {
        when: e.event_timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        kind: e.event_kind.to_string(),
        entity: match e.entity_id {
            Some(id) => format!("{} {}", e.entity_type, id),
            None => e.entity_type.clone(),
        },
        version: e.entity_version,
        initiator: e.initiator.clone(),
        summary: e.summary.clone(),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n{} event(s)", table, events.len())
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Ver")]
    version: i32,
    #[tabled(rename = "By")]
    initiator: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

/// Format an entity timeline
pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history found.".to_string();
    }

    let rows = entries.iter().map(|entry| HistoryRow {
        when: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        kind: format!("{} {}", entry.event_kind, entry.entity_type),
        version: entry.version,
        initiator: entry.initiator.clone(),
        changes: match &entry.changes {
            Some(changes) if changes.is_empty() => "-".to_string(),
            Some(changes) => changes
                .iter()
                .map(|c| {
                    format!(
                        "{}: {} -> {}",
                        c.field_name,
                        render(&c.old_value),
                        render(&c.new_value)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            None => entry.summary.clone(),
        },
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Old")]
    old: String,
    #[tabled(rename = "New")]
    new: String,
}

/// Format the changes of a single field, most recent first
pub fn format_field_history(field_name: &str, changes: &[FieldChange]) -> String {
    if changes.is_empty() {
        return format!("No changes recorded for '{}'.", field_name);
    }

    let rows = changes.iter().enumerate().map(|(i, c)| FieldRow {
        index: i + 1,
        old: render(&c.old_value),
        new: render(&c.new_value),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n{}", field_name, table)
}

/// Format one event with its full payload
pub fn format_event_details(event: &AuditEvent) -> String {
    let payload = serde_json::to_string_pretty(&event.payload)
        .unwrap_or_else(|_| event.payload.to_string());
    format!(
        "{}\nEvent:   {}\nDomain:  {}\nPayload:\n{}",
        event.format_human_readable(),
        event.event_id,
        event.domain,
        payload
    )
}

/// Format a reconstructed entity state as `field: value` lines
pub fn format_entity_state(
    entity_type: &str,
    entity_id: i64,
    state: Option<&serde_json::Value>,
) -> String {
    let fields = match state.and_then(|s| s.as_object()) {
        Some(fields) => fields,
        None => return format!("{} {} did not exist at that time.", entity_type, entity_id),
    };

    let mut output = format!("{} {}", entity_type, entity_id);
    for (name, value) in fields {
        output.push_str(&format!("\n  {}: {}", name, render(value)));
    }
    output
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
