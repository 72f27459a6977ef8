//! Service layer for audit-trail
//!
//! The service layer provides business logic on top of the storage layer:
//! validation, reference checks and uniqueness rules. Every mutating method
//! runs through the [`Auditor`] under a declared [`Operation`](crate::audit::Operation)
//! and is otherwise unaware of auditing.

pub mod address;
pub mod department;
pub mod employee;
pub mod enrollment;
pub mod training;

pub use address::{AddressService, AddressUpdate};
pub use department::DepartmentService;
pub use employee::{EmployeeService, EmployeeUpdate};
pub use enrollment::{EnrollmentService, EnrollmentUpdate};
pub use training::{TrainingService, TrainingUpdate};

use std::sync::Arc;

use crate::audit::{Auditor, JsonlEventStore, LoaderRegistry};
use crate::config::paths::AuditPaths;
use crate::config::settings::Settings;
use crate::error::{TrailError, TrailResult};
use crate::models::Entity;
use crate::storage::Storage;

/// Register every service's current-state loader
pub fn register_loaders(registry: &mut LoaderRegistry) {
    registry
        .register(employee::load)
        .register(department::load)
        .register(address::load)
        .register(training::load)
        .register(enrollment::load);
}

/// Open storage and the event log under `paths` and wire up an auditor
pub fn open_auditor(paths: &AuditPaths, settings: &Settings) -> TrailResult<Auditor> {
    paths.ensure_directories()?;
    let storage = Storage::open(paths.clone())?;
    let events = Arc::new(JsonlEventStore::new(paths.events_file()));

    let mut loaders = LoaderRegistry::new();
    register_loaders(&mut loaders);

    Ok(Auditor::new(storage, events, loaders, settings))
}

/// Reject a change made against an outdated copy
pub(crate) fn check_version<T: Entity>(entity: &T, expected: Option<i32>) -> TrailResult<()> {
    match (expected, entity.id()) {
        (Some(expected), Some(id)) if expected != entity.version() => {
            Err(TrailError::VersionConflict {
                entity_type: T::ENTITY_TYPE,
                id,
                expected,
                actual: entity.version(),
            })
        }
        _ => Ok(()),
    }
}

/// Trim a required text field, rejecting blanks
pub(crate) fn required(value: &str, what: &str) -> TrailResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TrailError::Validation(format!("{} cannot be empty", what)));
    }
    Ok(value.to_string())
}

/// Trim an optional text field; blank means "not set"
pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
