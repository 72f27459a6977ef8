//! History read model over the event store
//!
//! Turns raw events into per-entity timelines and per-field change lists.
//! A stored UPDATED payload that cannot be parsed never fails a query: the
//! timeline shows the entry with an empty change list, and field queries
//! skip it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::diff::FieldChange;
use super::event::{AuditEvent, EventKind, UpdatePayload};
use super::store::{EventFilter, EventStore};
use crate::error::TrailResult;

/// One event in an entity's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub entity_id: i64,
    pub entity_type: String,
    pub event_kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub initiator: String,
    pub version: i32,
    pub summary: String,
    /// Field changes; only present for UPDATED events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<FieldChange>>,
    /// Entity state after the event; for deletions, the state that was deleted
    pub current_state: Option<Value>,
}

/// History queries over an event store
pub struct AuditHistory<'a> {
    store: &'a dyn EventStore,
}

impl<'a> AuditHistory<'a> {
    pub fn new(store: &'a dyn EventStore) -> Self {
        Self { store }
    }

    /// Timeline of every event recorded for `entity_id`, most recent first
    ///
    /// Matches on id alone, so entities of different types sharing an id
    /// appear together. Use [`entity_history`](Self::entity_history) to
    /// narrow by type.
    pub fn history(&self, entity_id: i64) -> TrailResult<Vec<HistoryEntry>> {
        Ok(self
            .store
            .by_entity_id(entity_id)?
            .iter()
            .map(|event| to_entry(event, entity_id))
            .collect())
    }

    /// Timeline of one entity, most recent first
    pub fn entity_history(
        &self,
        entity_type: &str,
        entity_id: i64,
    ) -> TrailResult<Vec<HistoryEntry>> {
        Ok(self
            .store
            .by_entity_type_and_id(entity_type, entity_id)?
            .iter()
            .map(|event| to_entry(event, entity_id))
            .collect())
    }

    /// Every recorded change to `field_name` on `entity_id`, most recent first
    pub fn field_history(&self, entity_id: i64, field_name: &str) -> TrailResult<Vec<FieldChange>> {
        self.field_changes(
            EventFilter {
                entity_id: Some(entity_id),
                event_kind: Some(EventKind::Updated),
                ..Default::default()
            },
            field_name,
        )
    }

    /// Like [`field_history`](Self::field_history), narrowed to one entity type
    pub fn entity_field_history(
        &self,
        entity_type: &str,
        entity_id: i64,
        field_name: &str,
    ) -> TrailResult<Vec<FieldChange>> {
        self.field_changes(
            EventFilter {
                entity_type: Some(entity_type.to_string()),
                entity_id: Some(entity_id),
                event_kind: Some(EventKind::Updated),
                ..Default::default()
            },
            field_name,
        )
    }

    /// State of an entity as of `at`, reconstructed from its events
    ///
    /// `None` if the entity did not exist yet or had been deleted by then.
    pub fn state_at(
        &self,
        entity_type: &str,
        entity_id: i64,
        at: DateTime<Utc>,
    ) -> TrailResult<Option<Value>> {
        let latest = self
            .store
            .query(&EventFilter {
                entity_type: Some(entity_type.to_string()),
                entity_id: Some(entity_id),
                to: Some(at),
                limit: Some(1),
                ..Default::default()
            })?
            .into_iter()
            .next();

        Ok(latest.and_then(|event| match event.event_kind {
            EventKind::Deleted => None,
            _ => to_entry(&event, entity_id).current_state,
        }))
    }

    fn field_changes(&self, filter: EventFilter, field_name: &str) -> TrailResult<Vec<FieldChange>> {
        Ok(self
            .store
            .query(&filter)?
            .into_iter()
            .filter_map(|event| serde_json::from_value::<UpdatePayload>(event.payload).ok())
            .filter_map(|payload| {
                payload
                    .changes
                    .into_iter()
                    .find(|change| change.field_name == field_name)
            })
            .collect())
    }
}

fn to_entry(event: &AuditEvent, requested_id: i64) -> HistoryEntry {
    let (changes, current_state) = match event.event_kind {
        EventKind::Created => (None, Some(event.payload.clone())),
        EventKind::Deleted => (None, Some(event.payload.clone())),
        EventKind::Updated => {
            match serde_json::from_value::<UpdatePayload>(event.payload.clone()) {
                Ok(payload) => (
                    Some(payload.changes.into_changes()),
                    Some(payload.new_value),
                ),
                Err(e) => {
                    warn!(
                        event_id = %event.event_id,
                        error = %e,
                        "Malformed update payload, showing no changes"
                    );
                    (Some(Vec::new()), event.payload.get("newValue").cloned())
                }
            }
        }
    };

    HistoryEntry {
        entity_id: event.entity_id.unwrap_or(requested_id),
        entity_type: event.entity_type.clone(),
        event_kind: event.event_kind,
        timestamp: event.event_timestamp,
        initiator: event.initiator.clone(),
        version: event.entity_version,
        summary: event.summary.clone(),
        changes,
        current_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::diff::MetadataFields;
    use crate::audit::MemoryEventStore;
    use crate::models::{Department, Employee, Entity};
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn employee() -> Employee {
        let mut employee = Employee::new("Jane", "Doe", "jane.doe@x.com");
        employee.assign_identity(1, Utc::now());
        employee
    }

    fn update_event(before: &Employee, after: &Employee, at: DateTime<Utc>) -> AuditEvent {
        AuditEvent::updated(
            "HR",
            &before.to_fields().unwrap(),
            after,
            &MetadataFields::default(),
            "SYSTEM",
            at,
        )
        .unwrap()
    }

    fn seeded() -> (MemoryEventStore, DateTime<Utc>) {
        let store = MemoryEventStore::new();
        let t0 = Utc::now();

        let v1 = employee();
        let mut v2 = v1.clone();
        v2.last_name = "Smith".into();
        v2.email = "jane.smith@x.com".into();
        v2.touch(t0 + Duration::seconds(1));
        let mut v3 = v2.clone();
        v3.last_name = "Jones".into();
        v3.touch(t0 + Duration::seconds(2));

        store
            .append(&AuditEvent::created("HR", &v1, "SYSTEM", t0).unwrap())
            .unwrap();
        store
            .append(&update_event(&v1, &v2, t0 + Duration::seconds(1)))
            .unwrap();
        store
            .append(&update_event(&v2, &v3, t0 + Duration::seconds(2)))
            .unwrap();
        (store, t0)
    }

    #[test]
    fn test_history_timeline() {
        let (store, _) = seeded();
        let history = AuditHistory::new(&store).history(1).unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].version, 3);
        assert_eq!(history[2].event_kind, EventKind::Created);
        assert!(history[2].changes.is_none());
        assert_eq!(history[0].current_state.as_ref().unwrap()["lastName"], json!("Jones"));

        let changes = history[1].changes.as_ref().unwrap();
        let names: Vec<&str> = changes.iter().map(|c| c.field_name.as_str()).collect();
        assert_eq!(names, vec!["lastName", "email", "updatedTimestamp", "version"]);
    }

    #[test]
    fn test_field_history() {
        let (store, _) = seeded();
        let history = AuditHistory::new(&store);

        let last_names = history.field_history(1, "lastName").unwrap();
        assert_eq!(
            last_names,
            vec![
                FieldChange {
                    field_name: "lastName".into(),
                    old_value: json!("Smith"),
                    new_value: json!("Jones"),
                },
                FieldChange {
                    field_name: "lastName".into(),
                    old_value: json!("Doe"),
                    new_value: json!("Smith"),
                },
            ]
        );

        assert_eq!(history.field_history(1, "email").unwrap().len(), 1);
        assert!(history.field_history(1, "phone").unwrap().is_empty());
        assert!(history.field_history(99, "lastName").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_degrades() {
        let (store, _) = seeded();
        let mut broken = update_event(&employee(), &employee(), Utc::now() + Duration::seconds(10));
        broken.payload = json!({"changes": "not a map"});
        store.append(&broken).unwrap();

        let history = AuditHistory::new(&store);
        let timeline = history.history(1).unwrap();
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline[0].changes, Some(Vec::new()));
        assert_eq!(timeline[0].current_state, None);

        assert_eq!(history.field_history(1, "lastName").unwrap().len(), 2);
    }

    #[test]
    fn test_history_matches_id_across_types() {
        let (store, _) = seeded();
        let mut department = Department::new("Engineering");
        department.assign_identity(1, Utc::now());
        store
            .append(&AuditEvent::created("HR", &department, "SYSTEM", Utc::now()).unwrap())
            .unwrap();

        let history = AuditHistory::new(&store);
        assert_eq!(history.history(1).unwrap().len(), 4);
        assert_eq!(history.entity_history("EMPLOYEE", 1).unwrap().len(), 3);
        assert_eq!(history.entity_history("DEPARTMENT", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_state_at() {
        let (store, t0) = seeded();
        let history = AuditHistory::new(&store);

        assert_eq!(history.state_at("EMPLOYEE", 1, t0 - Duration::seconds(1)).unwrap(), None);

        let first = history.state_at("EMPLOYEE", 1, t0).unwrap().unwrap();
        assert_eq!(first["lastName"], json!("Doe"));

        let middle = history
            .state_at("EMPLOYEE", 1, t0 + Duration::milliseconds(1500))
            .unwrap()
            .unwrap();
        assert_eq!(middle["lastName"], json!("Smith"));

        let mut last = employee();
        last.last_name = "Jones".into();
        store
            .append(&AuditEvent::deleted("HR", &last, "SYSTEM", t0 + Duration::seconds(5)).unwrap())
            .unwrap();
        assert_eq!(history.state_at("EMPLOYEE", 1, t0 + Duration::seconds(5)).unwrap(), None);
        assert!(history
            .state_at("EMPLOYEE", 1, t0 + Duration::seconds(4))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_deleted_entry_keeps_final_state() {
        let (store, t0) = seeded();
        let mut last = employee();
        last.last_name = "Jones".into();
        let deleted = AuditEvent::deleted("HR", &last, "carol", t0 + Duration::seconds(3)).unwrap();
        store.append(&deleted).unwrap();

        let timeline = AuditHistory::new(&store).entity_history("EMPLOYEE", 1).unwrap();
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline[0].event_kind, EventKind::Deleted);
        assert!(timeline[0].changes.is_none());
        assert_eq!(timeline[0].current_state, Some(deleted.payload.clone()));
        assert_eq!(timeline[0].current_state.as_ref().unwrap()["lastName"], json!("Jones"));
    }
}
