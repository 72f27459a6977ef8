//! Export module for audit-trail
//!
//! Writes a list of audit events, as returned by any event store query, in
//! one of three formats:
//! - CSV: one row per event (spreadsheet-compatible)
//! - JSON: machine-readable, with schema version and export metadata
//! - YAML: human-readable, same structure as JSON

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_events_csv;
pub use self::json::{export_events_json, read_events_json, EventExport, EXPORT_SCHEMA_VERSION};
pub use self::yaml::export_events_yaml;

use std::fmt;
use std::io::Write;

use crate::audit::AuditEvent;
use crate::error::{TrailError, TrailResult};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn parse(s: &str) -> TrailResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(TrailError::Export(format!(
                "Unknown export format '{}' (expected csv, json or yaml)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Export events in the given format
pub fn export_events<W: Write>(
    format: ExportFormat,
    events: &[AuditEvent],
    writer: &mut W,
) -> TrailResult<()> {
    match format {
        ExportFormat::Csv => export_events_csv(events, writer),
        ExportFormat::Json => export_events_json(events, writer, true),
        ExportFormat::Yaml => export_events_yaml(events, writer),
    }
}
