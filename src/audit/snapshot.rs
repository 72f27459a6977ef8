//! Pre-mutation snapshots
//!
//! A snapshot is an independent deep copy of an entity taken before an
//! update or delete runs. Later mutation of the live entity never reaches
//! it. Each intercepted call owns its own snapshot; it is dropped when the
//! call ends, whatever the outcome.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::TrailResult;
use crate::models::Entity;

/// Deep copy of an entity's state at a point in time
#[derive(Debug, Clone)]
pub struct Snapshot<T: Entity> {
    state: T,
    fields: Option<Vec<(String, Value)>>,
    captured_at: DateTime<Utc>,
}

impl<T: Entity> Snapshot<T> {
    /// Copy the given entity
    ///
    /// The canonical field list is taken eagerly. If that fails the typed
    /// copy is still kept and the field list is rebuilt on demand.
    pub fn capture(entity: &T) -> Self {
        let fields = match entity.to_fields() {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!(
                    entity_type = T::ENTITY_TYPE,
                    entity_id = ?entity.id(),
                    error = %e,
                    "Could not copy field values; keeping typed copy only"
                );
                None
            }
        };

        Self {
            state: entity.clone(),
            fields,
            captured_at: Utc::now(),
        }
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Canonical ordered field list of the captured state
    pub fn fields(&self) -> TrailResult<Vec<(String, Value)>> {
        match &self.fields {
            Some(fields) => Ok(fields.clone()),
            None => self.state.to_fields(),
        }
    }
}

impl<T: Entity> Drop for Snapshot<T> {
    fn drop(&mut self) {
        trace!(
            entity_type = T::ENTITY_TYPE,
            entity_id = ?self.state.id(),
            "Snapshot released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employee;

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut employee = Employee::new("Jane", "Doe", "jane.doe@x.com");
        employee.assign_identity(1, Utc::now());
        let original = employee.clone();

        let snapshot = Snapshot::capture(&employee);
        assert_eq!(snapshot.state(), &employee);
        assert!(!std::ptr::eq(snapshot.state(), &employee));

        employee.last_name = "Smith".into();
        assert_eq!(snapshot.state(), &original);
        assert_ne!(snapshot.state(), &employee);
    }

    #[test]
    fn test_snapshot_fields_match_entity() {
        let mut employee = Employee::new("Jane", "Doe", "jane.doe@x.com");
        employee.assign_identity(1, Utc::now());

        let snapshot = Snapshot::capture(&employee);
        assert_eq!(snapshot.fields().unwrap(), employee.to_fields().unwrap());
        assert!(snapshot.captured_at() <= Utc::now());
    }
}
