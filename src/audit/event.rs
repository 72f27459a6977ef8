//! Audit event data structures
//!
//! Defines the immutable record written once per committed mutation, its
//! kind, and the structured payload stored for updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::diff::{self, ChangeSet, MetadataFields};
use super::summary;
use crate::error::TrailResult;
use crate::models::Entity;

/// Kind of mutation an event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// Entity was created
    Created,
    /// Entity was updated
    Updated,
    /// Entity was deleted
    Deleted,
}

impl EventKind {
    /// Parse a kind from user input (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CREATED" | "CREATE" => Some(Self::Created),
            "UPDATED" | "UPDATE" => Some(Self::Updated),
            "DELETED" | "DELETE" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Created => write!(f, "CREATED"),
            EventKind::Updated => write!(f, "UPDATED"),
            EventKind::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Payload stored on UPDATED events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    /// Full entity before the update
    pub old_value: Value,
    /// Full entity after the update
    pub new_value: Value,
    /// Field-level differences, in field declaration order
    pub changes: ChangeSet,
}

/// A single, immutable audit record
///
/// CREATED and DELETED events carry the full serialized entity as payload;
/// UPDATED events carry an [`UpdatePayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique id of this event
    pub event_id: Uuid,

    /// Business domain, e.g. `HR`
    pub domain: String,

    /// Entity type tag, e.g. `EMPLOYEE`
    pub entity_type: String,

    /// Id of the affected entity (`None` only if it could not be read)
    pub entity_id: Option<i64>,

    /// What happened
    pub event_kind: EventKind,

    /// Structured payload
    pub payload: Value,

    /// Human-readable description of the change
    pub summary: String,

    /// Entity version right after this event's commit
    pub entity_version: i32,

    /// When the mutation completed
    pub event_timestamp: DateTime<Utc>,

    /// When the event was written
    pub entry_timestamp: DateTime<Utc>,

    /// Who caused the mutation
    pub initiator: String,
}

impl AuditEvent {
    /// Build a CREATED event from the freshly stored entity
    pub fn created<T: Entity>(
        domain: &str,
        entity: &T,
        initiator: &str,
        at: DateTime<Utc>,
    ) -> TrailResult<Self> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            domain: domain.to_string(),
            entity_type: T::ENTITY_TYPE.to_string(),
            entity_id: entity.id(),
            event_kind: EventKind::Created,
            payload: serde_json::to_value(entity)?,
            summary: summary::created(T::ENTITY_TYPE),
            entity_version: entity.version(),
            event_timestamp: at,
            entry_timestamp: Utc::now(),
            initiator: initiator.to_string(),
        })
    }

    /// Build an UPDATED event from the pre-update state and the stored result
    pub fn updated<T: Entity>(
        domain: &str,
        before: &[(String, Value)],
        after: &T,
        metadata: &MetadataFields,
        initiator: &str,
        at: DateTime<Utc>,
    ) -> TrailResult<Self> {
        let after_fields = after.to_fields()?;
        let changes = diff::compute(before, &after_fields);
        let summary = summary::updated(T::ENTITY_TYPE, &changes, metadata);

        let payload = UpdatePayload {
            old_value: Value::Object(before.iter().cloned().collect()),
            new_value: Value::Object(after_fields.into_iter().collect()),
            changes,
        };

        Ok(Self {
            event_id: Uuid::new_v4(),
            domain: domain.to_string(),
            entity_type: T::ENTITY_TYPE.to_string(),
            entity_id: after.id(),
            event_kind: EventKind::Updated,
            payload: serde_json::to_value(&payload)?,
            summary,
            entity_version: after.version(),
            event_timestamp: at,
            entry_timestamp: Utc::now(),
            initiator: initiator.to_string(),
        })
    }

    /// Build a DELETED event from the pre-delete snapshot
    pub fn deleted<T: Entity>(
        domain: &str,
        snapshot: &T,
        initiator: &str,
        at: DateTime<Utc>,
    ) -> TrailResult<Self> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            domain: domain.to_string(),
            entity_type: T::ENTITY_TYPE.to_string(),
            entity_id: snapshot.id(),
            event_kind: EventKind::Deleted,
            payload: serde_json::to_value(snapshot)?,
            summary: summary::deleted(T::ENTITY_TYPE),
            entity_version: snapshot.version(),
            event_timestamp: at,
            entry_timestamp: Utc::now(),
            initiator: initiator.to_string(),
        })
    }

    /// Label used in logs and errors, e.g. `UPDATED HR/EMPLOYEE 7`
    pub fn label(&self) -> String {
        match self.entity_id {
            Some(id) => format!(
                "{} {}/{} {}",
                self.event_kind, self.domain, self.entity_type, id
            ),
            None => format!("{} {}/{}", self.event_kind, self.domain, self.entity_type),
        }
    }

    /// Format the event for human-readable output
    pub fn format_human_readable(&self) -> String {
        format!(
            "[{}] {} {} by {} (v{})\n  {}",
            self.event_timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.event_kind,
            self.entity_type,
            self.initiator,
            self.entity_version,
            self.summary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employee;
    use serde_json::json;

    fn stored_employee() -> Employee {
        let mut employee = Employee::new("Jane", "Doe", "jane.doe@x.com");
        employee.assign_identity(1, Utc::now());
        employee
    }

    #[test]
    fn test_event_kind_display_and_parse() {
        assert_eq!(EventKind::Created.to_string(), "CREATED");
        assert_eq!(EventKind::parse("deleted"), Some(EventKind::Deleted));
        assert_eq!(EventKind::parse("update"), Some(EventKind::Updated));
        assert_eq!(EventKind::parse("renamed"), None);
    }

    #[test]
    fn test_created_event() {
        let employee = stored_employee();
        let event = AuditEvent::created("HR", &employee, "SYSTEM", Utc::now()).unwrap();

        assert_eq!(event.event_kind, EventKind::Created);
        assert_eq!(event.entity_type, "EMPLOYEE");
        assert_eq!(event.entity_id, Some(1));
        assert_eq!(event.entity_version, 1);
        assert_eq!(event.summary, "EMPLOYEE created");
        assert_eq!(event.payload, serde_json::to_value(&employee).unwrap());
    }

    #[test]
    fn test_updated_event_payload_shape() {
        let before = stored_employee();
        let mut after = before.clone();
        after.last_name = "Smith".into();
        after.touch(Utc::now());

        let event = AuditEvent::updated(
            "HR",
            &before.to_fields().unwrap(),
            &after,
            &MetadataFields::default(),
            "hr-admin",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(event.entity_version, 2);
        assert_eq!(event.payload["oldValue"]["lastName"], json!("Doe"));
        assert_eq!(event.payload["newValue"]["lastName"], json!("Smith"));
        assert_eq!(
            event.payload["changes"]["lastName"],
            json!({"old": "Doe", "new": "Smith"})
        );
        assert_eq!(
            event.summary,
            "EMPLOYEE updated: lastName (from 'Doe' to 'Smith')"
        );
    }

    #[test]
    fn test_deleted_event_carries_snapshot() {
        let employee = stored_employee();
        let event = AuditEvent::deleted("HR", &employee, "SYSTEM", Utc::now()).unwrap();

        assert_eq!(event.event_kind, EventKind::Deleted);
        assert_eq!(event.summary, "EMPLOYEE deleted");
        assert_eq!(event.payload["email"], json!("jane.doe@x.com"));
    }

    #[test]
    fn test_serialized_layout_uses_camel_case() {
        let event = AuditEvent::created("HR", &stored_employee(), "SYSTEM", Utc::now()).unwrap();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventKind"], json!("CREATED"));
        assert_eq!(json["entityType"], json!("EMPLOYEE"));
        assert!(json.get("entryTimestamp").is_some());
    }

    #[test]
    fn test_human_readable_format() {
        let event = AuditEvent::created("HR", &stored_employee(), "alice", Utc::now()).unwrap();
        let formatted = event.format_human_readable();
        assert!(formatted.contains("CREATED"));
        assert!(formatted.contains("EMPLOYEE"));
        assert!(formatted.contains("by alice"));
    }
}
