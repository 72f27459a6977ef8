//! Core data models for audit-trail
//!
//! This module contains the audited HR entities (employees, departments,
//! addresses, trainings and training enrollments) and the [`Entity`] trait
//! every audited type implements.
//!
//! The trait's key contract is [`Entity::to_fields`]: a canonical, ordered
//! list of `(fieldName, value)` pairs in field declaration order. The diff
//! engine only ever sees that representation, never the concrete type.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{TrailError, TrailResult};

/// Canonical ordered field representation of an entity
pub type FieldList = Vec<(String, Value)>;

/// An entity type whose mutations are audited
pub trait Entity: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static {
    /// Upper-case type tag recorded on audit events, e.g. `EMPLOYEE`
    const ENTITY_TYPE: &'static str;

    /// Store-assigned identifier, `None` until first saved
    fn id(&self) -> Option<i64>;

    /// Optimistic-concurrency version (1 after create)
    fn version(&self) -> i32;

    /// Who last changed this entity, if recorded
    fn updated_by(&self) -> Option<&str>;

    /// Stamp a freshly inserted entity with its id, version 1 and timestamps
    fn assign_identity(&mut self, id: i64, at: DateTime<Utc>);

    /// Bump the version and refresh the update timestamp
    fn touch(&mut self, at: DateTime<Utc>);

    /// Canonical ordered `(fieldName, value)` list
    fn to_fields(&self) -> TrailResult<FieldList> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(TrailError::Json(format!(
                "{} did not serialize to an object: {}",
                Self::ENTITY_TYPE,
                other
            ))),
        }
    }
}

/// Implements [`Entity`] for a struct with the standard bookkeeping fields
/// (`id`, `created_timestamp`, `updated_timestamp`, `updated_by`, `version`).
macro_rules! impl_entity {
    ($ty:ty, $entity_type:literal) => {
        impl $crate::models::Entity for $ty {
            const ENTITY_TYPE: &'static str = $entity_type;

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn version(&self) -> i32 {
                self.version
            }

            fn updated_by(&self) -> Option<&str> {
                self.updated_by.as_deref()
            }

            fn assign_identity(&mut self, id: i64, at: chrono::DateTime<chrono::Utc>) {
                self.id = Some(id);
                self.version = 1;
                self.created_timestamp = at;
                self.updated_timestamp = at;
            }

            fn touch(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.version += 1;
                self.updated_timestamp = at;
            }
        }
    };
}

pub mod address;
pub mod department;
pub mod employee;
pub mod enrollment;
pub mod training;

pub use address::Address;
pub use department::Department;
pub use employee::Employee;
pub use enrollment::{EmployeeTraining, TrainingStatus};
pub use training::Training;
