//! JSON export of audit events

use crate::audit::AuditEvent;
use crate::error::{TrailError, TrailResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Wrapper written around exported events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub event_count: usize,

    /// Events in the order they were given
    pub events: Vec<AuditEvent>,
}

impl EventExport {
    pub fn new(events: &[AuditEvent]) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            event_count: events.len(),
            events: events.to_vec(),
        }
    }
}

/// Export events to JSON
pub fn export_events_json<W: Write>(
    events: &[AuditEvent],
    writer: &mut W,
    pretty: bool,
) -> TrailResult<()> {
    let export = EventExport::new(events);

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| TrailError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a JSON export
pub fn read_events_json(json_str: &str) -> TrailResult<EventExport> {
    let export: EventExport =
        serde_json::from_str(json_str).map_err(|e| TrailError::Export(e.to_string()))?;

    if export.event_count != export.events.len() {
        return Err(TrailError::Export(format!(
            "Export claims {} events but contains {}",
            export.event_count,
            export.events.len()
        )));
    }

    Ok(export)
}
