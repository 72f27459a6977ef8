//! Mutation interception
//!
//! Business code never writes audit events itself. A service declares an
//! [`Operation`] and hands its mutation to the [`Auditor`] as a closure over
//! a [`Transaction`]. The auditor:
//!
//! 1. opens the transaction (taking the single-writer lock),
//! 2. for updates and deletes, loads the current state through the
//!    entity's registered loader and keeps a [`Snapshot`] of it,
//! 3. runs the business closure,
//! 4. on success, builds the event and commits it together with the
//!    change, or rolls everything back if the event cannot be written.
//!
//! A failing business closure is returned untouched and leaves no event.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use super::diff::MetadataFields;
use super::event::AuditEvent;
use super::history::AuditHistory;
use super::retry::RetryConfig;
use super::snapshot::Snapshot;
use super::store::EventStore;
use crate::config::Settings;
use crate::error::{AuditFailure, TrailError, TrailResult};
use crate::models::Entity;
use crate::storage::{Storage, Transaction};

/// The kind of mutation an operation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Create => write!(f, "CREATE"),
            AuditAction::Update => write!(f, "UPDATE"),
            AuditAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// Declares a service operation as audited
///
/// Services keep these as constants next to the methods they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub action: AuditAction,
    pub entity_type: &'static str,
    /// Overrides the configured domain when set
    pub domain: Option<&'static str>,
}

impl Operation {
    pub const fn create(entity_type: &'static str) -> Self {
        Self {
            action: AuditAction::Create,
            entity_type,
            domain: None,
        }
    }

    pub const fn update(entity_type: &'static str) -> Self {
        Self {
            action: AuditAction::Update,
            entity_type,
            domain: None,
        }
    }

    pub const fn delete(entity_type: &'static str) -> Self {
        Self {
            action: AuditAction::Delete,
            entity_type,
            domain: None,
        }
    }

    pub const fn in_domain(mut self, domain: &'static str) -> Self {
        self.domain = Some(domain);
        self
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.domain {
            Some(domain) => write!(f, "{} {}/{}", self.action, domain, self.entity_type),
            None => write!(f, "{} {}", self.action, self.entity_type),
        }
    }
}

/// Reads the current state of an entity by id inside a transaction
pub type Loader<T> = Arc<dyn Fn(&Transaction<'_>, i64) -> TrailResult<Option<T>> + Send + Sync>;

/// Entity-type to loader lookup, filled once at startup
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the loader for `T`, replacing any previous one
    pub fn register<T, F>(&mut self, loader: F) -> &mut Self
    where
        T: Entity,
        F: Fn(&Transaction<'_>, i64) -> TrailResult<Option<T>> + Send + Sync + 'static,
    {
        let loader: Loader<T> = Arc::new(loader);
        self.loaders.insert(T::ENTITY_TYPE, Box::new(loader));
        self
    }

    pub fn is_registered(&self, entity_type: &str) -> bool {
        self.loaders.contains_key(entity_type)
    }

    /// Loader for `T`; a missing loader is a configuration error
    pub fn resolve<T: Entity>(&self) -> TrailResult<Loader<T>> {
        self.loaders
            .get(T::ENTITY_TYPE)
            .and_then(|boxed| boxed.downcast_ref::<Loader<T>>())
            .cloned()
            .ok_or_else(|| {
                TrailError::Config(format!("No loader registered for {}", T::ENTITY_TYPE))
            })
    }
}

/// Per-call audit context
///
/// Owns the snapshot for exactly one intercepted call; concurrent calls
/// each have their own.
struct Invocation<'a, T: Entity> {
    operation: &'a Operation,
    initiator: Option<&'a str>,
    snapshot: Option<Snapshot<T>>,
}

impl<'a, T: Entity> Invocation<'a, T> {
    fn new(operation: &'a Operation, initiator: Option<&'a str>) -> Self {
        Self {
            operation,
            initiator,
            snapshot: None,
        }
    }

    /// Snapshot the current state, if it can be read
    ///
    /// Failing to read is not fatal here; the operation still runs.
    fn capture(&mut self, tx: &Transaction<'_>, loader: &Loader<T>, id: i64) {
        match (loader.as_ref())(tx, id) {
            Ok(Some(current)) => self.snapshot = Some(Snapshot::capture(&current)),
            Ok(None) => debug!(
                operation = %self.operation,
                entity_id = id,
                "No current state to snapshot"
            ),
            Err(e) => warn!(
                operation = %self.operation,
                entity_id = id,
                error = %e,
                "Failed to load current state, continuing without snapshot"
            ),
        }
    }

    /// Explicit initiator, else the entity's `updatedBy`, else `fallback`
    fn resolve_initiator(&self, result: Option<&T>, fallback: &str) -> String {
        self.initiator
            .or_else(|| result.and_then(|r| r.updated_by()))
            .filter(|who| !who.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Runs audited operations against storage and the event store
pub struct Auditor {
    storage: Storage,
    events: Arc<dyn EventStore>,
    loaders: LoaderRegistry,
    domain: String,
    default_initiator: String,
    metadata: MetadataFields,
    retry: RetryConfig,
}

impl Auditor {
    pub fn new(
        storage: Storage,
        events: Arc<dyn EventStore>,
        loaders: LoaderRegistry,
        settings: &Settings,
    ) -> Self {
        Self {
            storage,
            events,
            loaders,
            domain: settings.domain.clone(),
            default_initiator: settings.default_initiator.clone(),
            metadata: settings.metadata(),
            retry: settings.retry.to_config(),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn events(&self) -> &dyn EventStore {
        self.events.as_ref()
    }

    /// History queries over this auditor's event store
    pub fn history(&self) -> AuditHistory<'_> {
        AuditHistory::new(self.events.as_ref())
    }

    /// Run an audited create
    pub fn create<T, F>(&self, op: &Operation, initiator: Option<&str>, f: F) -> TrailResult<T>
    where
        T: Entity,
        F: FnOnce(&mut Transaction<'_>) -> TrailResult<T>,
    {
        self.check::<T>(op, AuditAction::Create)?;
        let invocation = Invocation::<T>::new(op, initiator);

        let mut tx = self.storage.begin()?;
        let created = f(&mut tx)?;
        let at = Utc::now();

        let who = invocation.resolve_initiator(Some(&created), &self.default_initiator);
        let event = AuditEvent::created(self.domain_of(op), &created, &who, at)
            .map_err(|e| serialization_failure(op, e))?;

        self.commit(tx, event)?;
        Ok(created)
    }

    /// Run an audited update of entity `id`
    pub fn update<T, F>(
        &self,
        op: &Operation,
        id: i64,
        initiator: Option<&str>,
        f: F,
    ) -> TrailResult<T>
    where
        T: Entity,
        F: FnOnce(&mut Transaction<'_>) -> TrailResult<T>,
    {
        self.check::<T>(op, AuditAction::Update)?;
        let loader = self.loaders.resolve::<T>()?;
        let mut invocation = Invocation::<T>::new(op, initiator);

        let mut tx = self.storage.begin()?;
        invocation.capture(&tx, &loader, id);

        let updated = f(&mut tx)?;
        let at = Utc::now();

        let snapshot = invocation
            .snapshot
            .as_ref()
            .ok_or_else(|| missing_snapshot(op, id))?;
        let before = snapshot
            .fields()
            .map_err(|e| serialization_failure(op, e))?;

        let who = invocation.resolve_initiator(Some(&updated), &self.default_initiator);
        let event = AuditEvent::updated(
            self.domain_of(op),
            &before,
            &updated,
            &self.metadata,
            &who,
            at,
        )
        .map_err(|e| serialization_failure(op, e))?;

        self.commit(tx, event)?;
        Ok(updated)
    }

    /// Run an audited delete of entity `id`
    pub fn delete<T, R, F>(
        &self,
        op: &Operation,
        id: i64,
        initiator: Option<&str>,
        f: F,
    ) -> TrailResult<R>
    where
        T: Entity,
        F: FnOnce(&mut Transaction<'_>) -> TrailResult<R>,
    {
        self.check::<T>(op, AuditAction::Delete)?;
        let loader = self.loaders.resolve::<T>()?;
        let mut invocation = Invocation::<T>::new(op, initiator);

        let mut tx = self.storage.begin()?;
        invocation.capture(&tx, &loader, id);

        let outcome = f(&mut tx)?;
        let at = Utc::now();

        let snapshot = invocation
            .snapshot
            .as_ref()
            .ok_or_else(|| missing_snapshot(op, id))?;

        let who = invocation.resolve_initiator(None, &self.default_initiator);
        let event = AuditEvent::deleted(self.domain_of(op), snapshot.state(), &who, at)
            .map_err(|e| serialization_failure(op, e))?;

        self.commit(tx, event)?;
        Ok(outcome)
    }

    fn check<T: Entity>(&self, op: &Operation, expected: AuditAction) -> TrailResult<()> {
        if op.action != expected || op.entity_type != T::ENTITY_TYPE {
            return Err(TrailError::Config(format!(
                "Operation {} cannot run as {} {}",
                op,
                expected,
                T::ENTITY_TYPE
            )));
        }
        Ok(())
    }

    fn domain_of<'a>(&'a self, op: &'a Operation) -> &'a str {
        op.domain.unwrap_or(self.domain.as_str())
    }

    fn commit(&self, mut tx: Transaction<'_>, event: AuditEvent) -> TrailResult<()> {
        let label = event.label();
        let summary = event.summary.clone();
        tx.record_event(event)?;
        tx.commit(self.events.as_ref(), &self.retry)?;
        debug!(event = %label, summary = %summary, "Audit event committed");
        Ok(())
    }
}

fn serialization_failure(op: &Operation, e: TrailError) -> TrailError {
    TrailError::audit_failed(op, AuditFailure::Serialization(e.to_string()))
}

fn missing_snapshot(op: &Operation, id: i64) -> TrailError {
    error!(operation = %op, entity_id = id, "Operation succeeded without a pre-state snapshot");
    TrailError::audit_failed(op, AuditFailure::MissingSnapshot(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EventKind, MemoryEventStore};
    use crate::config::paths::AuditPaths;
    use crate::models::Department;
    use tempfile::TempDir;

    const CREATE: Operation = Operation::create("DEPARTMENT");
    const UPDATE: Operation = Operation::update("DEPARTMENT");
    const DELETE: Operation = Operation::delete("DEPARTMENT");

    fn auditor_with(loaders: LoaderRegistry) -> (TempDir, Auditor, Arc<MemoryEventStore>) {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        let events = Arc::new(MemoryEventStore::new());
        let auditor = Auditor::new(storage, events.clone(), loaders, &Settings::default());
        (temp_dir, auditor, events)
    }

    fn create_test_auditor() -> (TempDir, Auditor, Arc<MemoryEventStore>) {
        let mut loaders = LoaderRegistry::new();
        loaders.register::<Department, _>(|tx, id| tx.get(id));
        auditor_with(loaders)
    }

    fn add(auditor: &Auditor, name: &str) -> Department {
        auditor
            .create(&CREATE, None, |tx| tx.insert(Department::new(name)))
            .unwrap()
    }

    fn rename(auditor: &Auditor, id: i64, name: &str, by: Option<&str>) -> TrailResult<Department> {
        auditor.update(&UPDATE, id, by, |tx| {
            let mut department: Department = tx.require(id)?;
            department.name = name.to_string();
            tx.update(department)
        })
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(UPDATE.to_string(), "UPDATE DEPARTMENT");
        assert_eq!(UPDATE.in_domain("ORG").to_string(), "UPDATE ORG/DEPARTMENT");
    }

    #[test]
    fn test_create_records_event_with_default_initiator() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let department = add(&auditor, "Engineering");

        let recorded = events.list_all().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].event_kind, EventKind::Created);
        assert_eq!(recorded[0].entity_id, department.id);
        assert_eq!(recorded[0].initiator, "SYSTEM");
        assert_eq!(recorded[0].domain, "HR");
    }

    #[test]
    fn test_initiator_resolution_order() {
        let (_temp_dir, auditor, events) = create_test_auditor();

        let mut owned = Department::new("Sales");
        owned.updated_by = Some("carol".into());
        auditor
            .create(&CREATE, None, |tx| tx.insert(owned))
            .unwrap();
        assert_eq!(events.list_all().unwrap()[0].initiator, "carol");

        rename(&auditor, 1, "Field Sales", Some("dave")).unwrap();
        assert_eq!(events.list_all().unwrap()[0].initiator, "dave");
    }

    #[test]
    fn test_update_records_diff() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let department = add(&auditor, "Engineering");

        let renamed = rename(&auditor, department.id.unwrap(), "Platform", None).unwrap();
        assert_eq!(renamed.version, 2);

        let latest = &events.list_all().unwrap()[0];
        assert_eq!(latest.event_kind, EventKind::Updated);
        assert_eq!(latest.entity_version, 2);
        assert_eq!(
            latest.summary,
            "DEPARTMENT updated: name (from 'Engineering' to 'Platform')"
        );
    }

    #[test]
    fn test_delete_uses_snapshot() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let department = add(&auditor, "Engineering");
        let id = department.id.unwrap();

        auditor
            .delete::<Department, _, _>(&DELETE, id, Some("erin"), |tx| {
                tx.delete::<Department>(id).map(|_| ())
            })
            .unwrap();

        let latest = &events.list_all().unwrap()[0];
        assert_eq!(latest.event_kind, EventKind::Deleted);
        assert_eq!(latest.payload["name"], "Engineering");
        assert_eq!(latest.entity_version, 1);
        assert_eq!(latest.initiator, "erin");
    }

    #[test]
    fn test_business_error_passes_through_without_event() {
        let (_temp_dir, auditor, events) = create_test_auditor();

        let result: TrailResult<Department> = auditor.create(&CREATE, None, |tx| {
            tx.insert(Department::new("Half done"))?;
            Err(TrailError::Validation("rejected".into()))
        });

        assert!(matches!(result, Err(TrailError::Validation(_))));
        assert_eq!(events.count().unwrap(), 0);
        assert_eq!(auditor.storage().departments.count().unwrap(), 0);
    }

    #[test]
    fn test_missing_loader_is_config_error() {
        let (_temp_dir, auditor, _events) = auditor_with(LoaderRegistry::new());
        let err = rename(&auditor, 1, "Platform", None).unwrap_err();
        assert!(matches!(err, TrailError::Config(_)));
    }

    #[test]
    fn test_update_without_snapshot_is_rolled_back() {
        let mut loaders = LoaderRegistry::new();
        loaders.register::<Department, _>(|_tx, _id| {
            Err(TrailError::Storage("loader offline".into()))
        });
        let (_temp_dir, auditor, events) = auditor_with(loaders);
        add(&auditor, "Engineering");

        let err = rename(&auditor, 1, "Platform", None).unwrap_err();
        assert!(matches!(
            err,
            TrailError::AuditFailed {
                reason: AuditFailure::MissingSnapshot(1),
                ..
            }
        ));
        assert_eq!(events.count().unwrap(), 1);
        let stored = auditor.storage().departments.get(1).unwrap().unwrap();
        assert_eq!(stored.name, "Engineering");
    }

    #[test]
    fn test_mismatched_operation_is_rejected() {
        let (_temp_dir, auditor, _events) = create_test_auditor();
        let result = auditor.create(&UPDATE, None, |tx| tx.insert(Department::new("X")));
        assert!(matches!(result, Err(TrailError::Config(_))));
    }

    #[test]
    fn test_registry_resolves_by_type() {
        let mut loaders = LoaderRegistry::new();
        loaders.register::<Department, _>(|tx, id| tx.get(id));
        assert!(loaders.is_registered("DEPARTMENT"));
        assert!(loaders.resolve::<Department>().is_ok());
        assert!(loaders.resolve::<crate::models::Employee>().is_err());
    }
}
