//! Change auditing for audit-trail
//!
//! Records every create, update and delete of an audited entity as an
//! immutable event, without the business code knowing about it.
//!
//! # Architecture
//!
//! - [`Auditor`]: wraps a declared [`Operation`], snapshots the pre-state,
//!   runs the business closure and commits the event with the change.
//! - [`Snapshot`]: independent copy of an entity taken before it mutates.
//! - [`diff`]: ordered field-level [`ChangeSet`] between two states.
//! - [`summary`]: one-line, human-readable description of an event.
//! - [`EventStore`]: append-only storage with most-recent-first queries.
//! - [`AuditHistory`]: timelines and per-field change lists.
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_trail::audit::Operation;
//!
//! const UPDATE_DEPARTMENT: Operation = Operation::update("DEPARTMENT");
//!
//! let renamed = auditor.update(&UPDATE_DEPARTMENT, id, Some("alice"), |tx| {
//!     let mut department: Department = tx.require(id)?;
//!     department.name = "Platform".into();
//!     tx.update(department)
//! })?;
//!
//! for entry in auditor.history().history(id)? {
//!     println!("{} {}", entry.event_kind, entry.summary);
//! }
//! ```

pub mod diff;
pub mod event;
pub mod history;
pub mod interceptor;
pub mod retry;
pub mod snapshot;
pub mod store;
pub mod summary;

pub use diff::{ChangeSet, FieldChange, MetadataFields};
pub use event::{AuditEvent, EventKind, UpdatePayload};
pub use history::{AuditHistory, HistoryEntry};
pub use interceptor::{AuditAction, Auditor, Loader, LoaderRegistry, Operation};
pub use retry::RetryConfig;
pub use snapshot::Snapshot;
pub use store::{EventFilter, EventStore, JsonlEventStore, MemoryEventStore};
