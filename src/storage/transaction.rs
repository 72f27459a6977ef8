//! Unit of work over the entity tables
//!
//! A [`Transaction`] holds the storage write lock for its whole lifetime, so
//! mutations are serialized across threads. Changes are applied to the
//! in-memory tables immediately and recorded in an undo log. Nothing reaches
//! disk until [`Transaction::commit`], which writes the touched tables and
//! then appends the pending audit event. If that append fails the undo log
//! is replayed and the tables are written again, leaving no trace of the
//! change. Dropping a transaction without committing rolls it back.

use std::collections::BTreeSet;
use std::sync::MutexGuard;

use chrono::Utc;
use tracing::{debug, error};

use super::{Storage, Stored};
use crate::audit::retry::{retry_with_backoff, RetryConfig};
use crate::audit::{AuditEvent, EventStore};
use crate::error::{AuditFailure, TrailError, TrailResult};

type UndoStep = Box<dyn FnOnce(&Storage) -> TrailResult<()>>;

/// A single-writer unit of work
pub struct Transaction<'a> {
    storage: &'a Storage,
    _guard: MutexGuard<'a, ()>,
    undo: Vec<UndoStep>,
    touched: BTreeSet<&'static str>,
    pending_event: Option<AuditEvent>,
    written: bool,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(super) fn new(storage: &'a Storage, guard: MutexGuard<'a, ()>) -> Self {
        Self {
            storage,
            _guard: guard,
            undo: Vec::new(),
            touched: BTreeSet::new(),
            pending_event: None,
            written: false,
            finished: false,
        }
    }

    /// Current state of a row, including this transaction's changes
    pub fn get<T: Stored>(&self, id: i64) -> TrailResult<Option<T>> {
        T::repository(self.storage).get(id)
    }

    /// Like [`get`](Self::get) but a missing row is an error
    pub fn require<T: Stored>(&self, id: i64) -> TrailResult<T> {
        self.get(id)?
            .ok_or_else(|| TrailError::not_found(T::ENTITY_TYPE, id))
    }

    pub fn exists<T: Stored>(&self, id: i64) -> TrailResult<bool> {
        T::repository(self.storage).exists(id)
    }

    pub fn find<T, P>(&self, predicate: P) -> TrailResult<Option<T>>
    where
        T: Stored,
        P: Fn(&T) -> bool,
    {
        T::repository(self.storage).find(predicate)
    }

    pub fn filter<T, P>(&self, predicate: P) -> TrailResult<Vec<T>>
    where
        T: Stored,
        P: Fn(&T) -> bool,
    {
        T::repository(self.storage).filter(predicate)
    }

    /// Insert a new row, assigning its id, version 1 and timestamps
    pub fn insert<T: Stored>(&mut self, mut entity: T) -> TrailResult<T> {
        let repo = T::repository(self.storage);
        let id = repo.allocate_id()?;
        entity.assign_identity(id, Utc::now());
        repo.put(entity.clone())?;

        self.undo.push(Box::new(move |storage: &Storage| {
            T::repository(storage).remove(id).map(|_| ())
        }));
        self.touched.insert(T::ENTITY_TYPE);
        Ok(entity)
    }

    /// Replace an existing row
    ///
    /// An entity identical to the stored row is a no-op: version and update
    /// timestamp stay as they are. Otherwise the version is bumped. A stale
    /// copy (version behind the stored row) is rejected.
    pub fn update<T: Stored>(&mut self, mut entity: T) -> TrailResult<T> {
        let id = entity.id().ok_or_else(|| {
            TrailError::Validation(format!("Cannot update an unsaved {}", T::ENTITY_TYPE))
        })?;

        let repo = T::repository(self.storage);
        let existing = repo
            .get(id)?
            .ok_or_else(|| TrailError::not_found(T::ENTITY_TYPE, id))?;

        if entity.version() != existing.version() {
            return Err(TrailError::VersionConflict {
                entity_type: T::ENTITY_TYPE,
                id,
                expected: entity.version(),
                actual: existing.version(),
            });
        }

        if entity == existing {
            debug!(entity_type = T::ENTITY_TYPE, id, "Update left entity unchanged");
            return Ok(existing);
        }

        entity.touch(Utc::now());
        repo.put(entity.clone())?;

        self.undo.push(Box::new(move |storage: &Storage| {
            T::repository(storage).put(existing).map(|_| ())
        }));
        self.touched.insert(T::ENTITY_TYPE);
        Ok(entity)
    }

    /// Remove a row, returning its last state
    pub fn delete<T: Stored>(&mut self, id: i64) -> TrailResult<T> {
        let removed = T::repository(self.storage)
            .remove(id)?
            .ok_or_else(|| TrailError::not_found(T::ENTITY_TYPE, id))?;

        let restore = removed.clone();
        self.undo.push(Box::new(move |storage: &Storage| {
            T::repository(storage).put(restore).map(|_| ())
        }));
        self.touched.insert(T::ENTITY_TYPE);
        Ok(removed)
    }

    /// Attach the audit event to be appended on commit
    pub fn record_event(&mut self, event: AuditEvent) -> TrailResult<()> {
        if self.pending_event.is_some() {
            return Err(TrailError::Storage(
                "Transaction already carries an audit event".into(),
            ));
        }
        self.pending_event = Some(event);
        Ok(())
    }

    /// Whether any table was changed
    pub fn has_changes(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Make the changes durable and append the pending event
    ///
    /// Either both the changes and the event are stored, or neither is.
    /// An append that still fails after `retry` yields
    /// [`TrailError::AuditFailed`].
    pub fn commit(mut self, events: &dyn EventStore, retry: &RetryConfig) -> TrailResult<()> {
        self.written = !self.touched.is_empty();
        if let Err(e) = self.write_touched() {
            error!(error = %e, "Failed to write tables, rolling back");
            self.rollback_in_place();
            return Err(e);
        }

        if let Some(event) = self.pending_event.take() {
            let label = event.label();
            if let Err(e) = retry_with_backoff(retry, "Audit event append", || events.append(&event)) {
                error!(event = %label, error = %e, "Audit append failed, rolling back");
                self.rollback_in_place();
                return Err(TrailError::audit_failed(
                    label,
                    AuditFailure::Append(e.to_string()),
                ));
            }
        }

        self.finished = true;
        debug!(tables = ?self.touched, "Transaction committed");
        Ok(())
    }

    /// Discard all changes
    pub fn rollback(mut self) {
        self.rollback_in_place();
    }

    fn write_touched(&self) -> TrailResult<()> {
        for entity_type in &self.touched {
            self.storage.save_table(entity_type)?;
        }
        Ok(())
    }

    fn rollback_in_place(&mut self) {
        self.finished = true;
        self.pending_event = None;

        while let Some(step) = self.undo.pop() {
            if let Err(e) = step(self.storage) {
                error!(error = %e, "Failed to undo change");
            }
        }

        if self.written {
            if let Err(e) = self.write_touched() {
                error!(error = %e, "Failed to restore tables on disk");
            }
        }

        debug!(tables = ?self.touched, "Transaction rolled back");
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback_in_place();
        }
    }
}
