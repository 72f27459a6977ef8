//! CSV export of audit events
//!
//! One row per event; the payload goes in its last column as compact JSON.

use crate::audit::AuditEvent;
use crate::error::{TrailError, TrailResult};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRow<'a> {
    event_id: String,
    event_timestamp: String,
    entry_timestamp: String,
    domain: &'a str,
    entity_type: &'a str,
    entity_id: Option<i64>,
    event_kind: String,
    entity_version: i32,
    initiator: &'a str,
    summary: &'a str,
    payload: String,
}

impl<'a> EventRow<'a> {
    fn from_event(event: &'a AuditEvent) -> TrailResult<Self> {
        Ok(Self {
            event_id: event.event_id.to_string(),
            event_timestamp: event.event_timestamp.to_rfc3339(),
            entry_timestamp: event.entry_timestamp.to_rfc3339(),
            domain: &event.domain,
            entity_type: &event.entity_type,
            entity_id: event.entity_id,
            event_kind: event.event_kind.to_string(),
            entity_version: event.entity_version,
            initiator: &event.initiator,
            summary: &event.summary,
            payload: serde_json::to_string(&event.payload)?,
        })
    }
}

/// Export events to CSV with a header row
pub fn export_events_csv<W: Write>(events: &[AuditEvent], writer: &mut W) -> TrailResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for event in events {
        csv_writer
            .serialize(EventRow::from_event(event)?)
            .map_err(|e| TrailError::Export(e.to_string()))?;
    }

    // An empty export still gets its header
    if events.is_empty() {
        csv_writer
            .write_record([
                "eventId",
                "eventTimestamp",
                "entryTimestamp",
                "domain",
                "entityType",
                "entityId",
                "eventKind",
                "entityVersion",
                "initiator",
                "summary",
                "payload",
            ])
            .map_err(|e| TrailError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| TrailError::Export(e.to_string()))?;
    Ok(())
}
