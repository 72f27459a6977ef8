//! Append-only event store
//!
//! [`EventStore`] is the seam between the interceptor and durable storage.
//! Implementations only need `append` and `read_all`; every query is
//! provided on top of those and returns events most-recent-first. Events
//! with identical timestamps come out in reverse append order.
//!
//! [`JsonlEventStore`] keeps one JSON object per line in a file, flushed
//! and synced on every append. [`MemoryEventStore`] keeps events in memory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::event::{AuditEvent, EventKind};
use crate::error::{TrailError, TrailResult};
use crate::storage::file_io::append_record;

/// Criteria for selecting events; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub event_kind: Option<EventKind>,
    pub initiator: Option<String>,
    /// Inclusive lower bound on the event timestamp
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the event timestamp
    pub to: Option<DateTime<Utc>>,
    /// Keep only the N most recent matches
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(entity_type) = &self.entity_type {
            if event.entity_type != *entity_type {
                return false;
            }
        }
        if let Some(id) = self.entity_id {
            if event.entity_id != Some(id) {
                return false;
            }
        }
        if let Some(kind) = self.event_kind {
            if event.event_kind != kind {
                return false;
            }
        }
        if let Some(initiator) = &self.initiator {
            if event.initiator != *initiator {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.event_timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.event_timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Sort events most-recent-first, ties in reverse append order
///
/// Expects `events` in append order.
fn newest_first(events: &mut Vec<AuditEvent>) {
    events.reverse();
    events.sort_by(|a, b| b.event_timestamp.cmp(&a.event_timestamp));
}

/// Durable, append-only storage for audit events
pub trait EventStore: Send + Sync {
    /// Persist one event
    fn append(&self, event: &AuditEvent) -> TrailResult<()>;

    /// Every stored event, in append order
    fn read_all(&self) -> TrailResult<Vec<AuditEvent>>;

    /// Events matching `filter`, most recent first
    fn query(&self, filter: &EventFilter) -> TrailResult<Vec<AuditEvent>> {
        let mut events: Vec<AuditEvent> = self
            .read_all()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        newest_first(&mut events);
        if let Some(limit) = filter.limit {
            events.truncate(limit);
        }
        Ok(events)
    }

    fn count(&self) -> TrailResult<usize> {
        Ok(self.read_all()?.len())
    }

    fn list_all(&self) -> TrailResult<Vec<AuditEvent>> {
        self.query(&EventFilter::default())
    }

    /// Events for an entity id, across all entity types
    fn by_entity_id(&self, entity_id: i64) -> TrailResult<Vec<AuditEvent>> {
        self.query(&EventFilter {
            entity_id: Some(entity_id),
            ..Default::default()
        })
    }

    fn by_entity_type(&self, entity_type: &str) -> TrailResult<Vec<AuditEvent>> {
        self.query(&EventFilter {
            entity_type: Some(entity_type.to_string()),
            ..Default::default()
        })
    }

    fn by_event_kind(&self, kind: EventKind) -> TrailResult<Vec<AuditEvent>> {
        self.query(&EventFilter {
            event_kind: Some(kind),
            ..Default::default()
        })
    }

    fn by_initiator(&self, initiator: &str) -> TrailResult<Vec<AuditEvent>> {
        self.query(&EventFilter {
            initiator: Some(initiator.to_string()),
            ..Default::default()
        })
    }

    /// Events with `start <= timestamp <= end`
    fn by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TrailResult<Vec<AuditEvent>> {
        self.query(&EventFilter {
            from: Some(start),
            to: Some(end),
            ..Default::default()
        })
    }

    fn by_entity_type_and_id(
        &self,
        entity_type: &str,
        entity_id: i64,
    ) -> TrailResult<Vec<AuditEvent>> {
        self.query(&EventFilter {
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id),
            ..Default::default()
        })
    }
}

/// Event store backed by a line-delimited JSON file
pub struct JsonlEventStore {
    path: PathBuf,
    /// Serializes appends from this process
    append_lock: Mutex<()>,
}

impl JsonlEventStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl EventStore for JsonlEventStore {
    fn append(&self, event: &AuditEvent) -> TrailResult<()> {
        let mut line = serde_json::to_string(event)
            .map_err(|e| TrailError::Json(format!("Failed to serialize audit event: {}", e)))?;
        line.push('\n');

        let _guard = self
            .append_lock
            .lock()
            .map_err(|e| TrailError::Storage(format!("Event log lock poisoned: {}", e)))?;

        // A failed attempt is cut back off the log, so retries stay single
        append_record(&self.path, line.as_bytes()).map_err(|e| {
            TrailError::Io(format!(
                "Failed to append audit event to {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(event = %event.label(), "Appended audit event");
        Ok(())
    }

    fn read_all(&self) -> TrailResult<Vec<AuditEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| TrailError::Io(format!("Failed to open event log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                TrailError::Io(format!(
                    "Failed to read event log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<AuditEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    line = line_num + 1,
                    path = %self.path.display(),
                    error = %e,
                    "Skipping unreadable audit event"
                ),
            }
        }

        Ok(events)
    }
}

/// Event store held entirely in memory
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryEventStore {
    fn append(&self, event: &AuditEvent) -> TrailResult<()> {
        let mut events = self
            .events
            .write()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        events.push(event.clone());
        Ok(())
    }

    fn read_all(&self) -> TrailResult<Vec<AuditEvent>> {
        let events = self
            .events
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Department, Employee, Entity};
    use chrono::Duration;
    use tempfile::TempDir;

    fn event_at<T: Entity>(entity: &T, kind: EventKind, initiator: &str, at: DateTime<Utc>) -> AuditEvent {
        let mut event = match kind {
            EventKind::Deleted => AuditEvent::deleted("HR", entity, initiator, at),
            _ => AuditEvent::created("HR", entity, initiator, at),
        }
        .unwrap();
        event.event_kind = kind;
        event
    }

    fn employee(id: i64) -> Employee {
        let mut employee = Employee::new("Jane", "Doe", format!("jane{}@x.com", id));
        employee.assign_identity(id, Utc::now());
        employee
    }

    fn department(id: i64) -> Department {
        let mut department = Department::new("Engineering");
        department.assign_identity(id, Utc::now());
        department
    }

    fn seeded_store() -> (MemoryEventStore, DateTime<Utc>) {
        let store = MemoryEventStore::new();
        let t0 = Utc::now();
        store
            .append(&event_at(&employee(1), EventKind::Created, "alice", t0))
            .unwrap();
        store
            .append(&event_at(&department(1), EventKind::Created, "bob", t0 + Duration::seconds(1)))
            .unwrap();
        store
            .append(&event_at(&employee(1), EventKind::Updated, "bob", t0 + Duration::seconds(2)))
            .unwrap();
        store
            .append(&event_at(&employee(2), EventKind::Deleted, "alice", t0 + Duration::seconds(3)))
            .unwrap();
        (store, t0)
    }

    #[test]
    fn test_list_all_is_most_recent_first() {
        let (store, _) = seeded_store();
        let events = store.list_all().unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.event_kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Deleted,
                EventKind::Updated,
                EventKind::Created,
                EventKind::Created
            ]
        );
    }

    #[test]
    fn test_identical_timestamps_reverse_append_order() {
        let store = MemoryEventStore::new();
        let at = Utc::now();
        let first = event_at(&employee(1), EventKind::Created, "alice", at);
        let second = event_at(&employee(1), EventKind::Updated, "alice", at);
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let events = store.list_all().unwrap();
        assert_eq!(events[0].event_id, second.event_id);
        assert_eq!(events[1].event_id, first.event_id);
    }

    #[test]
    fn test_by_entity_id_spans_types() {
        let (store, _) = seeded_store();
        assert_eq!(store.by_entity_id(1).unwrap().len(), 3);
        assert_eq!(store.by_entity_type_and_id("EMPLOYEE", 1).unwrap().len(), 2);
        assert!(store.by_entity_id(99).unwrap().is_empty());
    }

    #[test]
    fn test_simple_filters() {
        let (store, _) = seeded_store();
        assert_eq!(store.by_entity_type("DEPARTMENT").unwrap().len(), 1);
        assert_eq!(store.by_event_kind(EventKind::Created).unwrap().len(), 2);
        assert_eq!(store.by_initiator("alice").unwrap().len(), 2);
        assert!(store.by_initiator("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let (store, t0) = seeded_store();
        let events = store
            .by_date_range(t0 + Duration::seconds(1), t0 + Duration::seconds(2))
            .unwrap();
        assert_eq!(events.len(), 2);

        let exact = store.by_date_range(t0, t0).unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let (store, _) = seeded_store();
        let events = store
            .query(&EventFilter {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_kind, EventKind::Deleted);
    }

    #[test]
    fn test_jsonl_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonlEventStore::new(temp_dir.path().join("events.jsonl"));
        assert!(store.read_all().unwrap().is_empty());

        let event = event_at(&employee(1), EventKind::Created, "alice", Utc::now());
        store.append(&event).unwrap();
        store.append(&event_at(&employee(2), EventKind::Created, "alice", Utc::now())).unwrap();

        assert!(store.exists());
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.read_all().unwrap()[0], event);

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_jsonl_skips_torn_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        let first = event_at(&employee(1), EventKind::Created, "alice", Utc::now());
        let second = event_at(&employee(1), EventKind::Deleted, "bob", Utc::now());
        let content = format!(
            "{}\n{{\"eventId\":\"abc\n{}\n",
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        std::fs::write(&path, content).unwrap();

        let store = JsonlEventStore::new(path);
        let events = store.by_entity_id(1).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_kind, EventKind::Deleted);
        assert_eq!(events[1].event_kind, EventKind::Created);
    }

    #[test]
    fn test_jsonl_append_after_torn_tail() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        std::fs::write(&path, "{\"eventId\":\"abc").unwrap();

        let store = JsonlEventStore::new(path);
        store
            .append(&event_at(&employee(1), EventKind::Created, "alice", Utc::now()))
            .unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_jsonl_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");

        JsonlEventStore::new(path.clone())
            .append(&event_at(&employee(1), EventKind::Created, "alice", Utc::now()))
            .unwrap();

        let reopened = JsonlEventStore::new(path);
        assert_eq!(reopened.by_entity_id(1).unwrap().len(), 1);
    }
}
