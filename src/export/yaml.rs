//! YAML export of audit events

use crate::audit::AuditEvent;
use crate::error::{TrailError, TrailResult};
use crate::export::json::EventExport;
use std::io::Write;

/// Export events to YAML, preceded by a comment header
pub fn export_events_yaml<W: Write>(events: &[AuditEvent], writer: &mut W) -> TrailResult<()> {
    let export = EventExport::new(events);

    let header = format!(
        "# audit-trail event export\n# Generated: {}\n# App Version: {}\n# Events: {}\n\n",
        export.exported_at, export.app_version, export.event_count
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| TrailError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| TrailError::Export(e.to_string()))?;

    Ok(())
}
