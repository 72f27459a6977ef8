//! Audit trail CLI commands
//!
//! Read-only queries over the event log, plus export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Subcommand;

use super::{entity_type, parse_timestamp};
use crate::audit::{Auditor, EventFilter, EventKind};
use crate::display::{
    format_entity_state, format_event_table, format_field_history, format_history,
};
use crate::error::{TrailError, TrailResult};
use crate::export::{export_events, ExportFormat};

/// Audit subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// List events, most recent first
    List {
        /// Number of events to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Events for an entity id
    Entity {
        id: i64,
        /// Restrict to one entity type
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
    },

    /// Events for an entity type
    Type { entity_type: String },

    /// Events of one kind (created, updated, deleted)
    Kind { kind: String },

    /// Events made by an initiator
    Initiator { initiator: String },

    /// Events between two instants (inclusive)
    Range {
        /// Start (RFC 3339 or YYYY-MM-DD)
        from: String,
        /// End (RFC 3339 or YYYY-MM-DD, whole day)
        to: String,
    },

    /// Timeline of an entity
    History {
        id: i64,
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
    },

    /// Changes of one field of an entity
    Field {
        id: i64,
        field: String,
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
    },

    /// State of an entity as of an instant
    State {
        entity_type: String,
        id: i64,
        /// Instant (RFC 3339, or YYYY-MM-DD for the end of that day)
        at: String,
    },

    /// Export events (csv, json, yaml)
    Export {
        format: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
        #[arg(long)]
        id: Option<i64>,
    },
}

/// Handle an audit command
pub fn handle_audit_command(auditor: &Auditor, cmd: AuditCommands) -> TrailResult<()> {
    let events = auditor.events();
    let history = auditor.history();

    match cmd {
        AuditCommands::List { limit } => {
            let found = events.query(&EventFilter {
                limit,
                ..Default::default()
            })?;
            println!("{}", format_event_table(&found));
        }

        AuditCommands::Entity { id, entity_type: ty } => {
            let found = match ty {
                Some(ty) => events.by_entity_type_and_id(&entity_type(&ty), id)?,
                None => events.by_entity_id(id)?,
            };
            println!("{}", format_event_table(&found));
        }

        AuditCommands::Type { entity_type: ty } => {
            println!("{}", format_event_table(&events.by_entity_type(&entity_type(&ty))?));
        }

        AuditCommands::Kind { kind } => {
            let kind = EventKind::parse(&kind).ok_or_else(|| {
                TrailError::Validation(format!(
                    "Unknown event kind '{}' (expected created, updated or deleted)",
                    kind
                ))
            })?;
            println!("{}", format_event_table(&events.by_event_kind(kind)?));
        }

        AuditCommands::Initiator { initiator } => {
            println!("{}", format_event_table(&events.by_initiator(&initiator)?));
        }

        AuditCommands::Range { from, to } => {
            let from = parse_timestamp(&from, false)?;
            let to = parse_timestamp(&to, true)?;
            println!("{}", format_event_table(&events.by_date_range(from, to)?));
        }

        AuditCommands::History { id, entity_type: ty } => {
            let entries = match ty {
                Some(ty) => history.entity_history(&entity_type(&ty), id)?,
                None => history.history(id)?,
            };
            println!("{}", format_history(&entries));
        }

        AuditCommands::Field {
            id,
            field,
            entity_type: ty,
        } => {
            let changes = match ty {
                Some(ty) => history.entity_field_history(&entity_type(&ty), id, &field)?,
                None => history.field_history(id, &field)?,
            };
            println!("{}", format_field_history(&field, &changes));
        }

        AuditCommands::State {
            entity_type: ty,
            id,
            at,
        } => {
            let ty = entity_type(&ty);
            let at = parse_timestamp(&at, true)?;
            let state = history.state_at(&ty, id, at)?;
            println!("{}", format_entity_state(&ty, id, state.as_ref()));
        }

        AuditCommands::Export {
            format,
            output,
            entity_type: ty,
            id,
        } => {
            let format = ExportFormat::parse(&format)?;
            let found = events.query(&EventFilter {
                entity_type: ty.as_deref().map(entity_type),
                entity_id: id,
                ..Default::default()
            })?;

            match output {
                Some(path) => {
                    let file = File::create(&path).map_err(|e| {
                        TrailError::Export(format!("Cannot create {}: {}", path.display(), e))
                    })?;
                    let mut writer = BufWriter::new(file);
                    export_events(format, &found, &mut writer)?;
                    writer
                        .flush()
                        .map_err(|e| TrailError::Export(e.to_string()))?;
                    println!(
                        "Exported {} event(s) as {} to {}",
                        found.len(),
                        format,
                        path.display()
                    );
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    export_events(format, &found, &mut handle)?;
                }
            }
        }
    }

    Ok(())
}
