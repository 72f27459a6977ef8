//! Training service

use crate::audit::{Auditor, Operation};
use crate::error::{TrailError, TrailResult};
use crate::models::{EmployeeTraining, Entity, Training};
use crate::storage::Transaction;

use super::{check_version, optional, required};

pub const CREATE_TRAINING: Operation = Operation::create(Training::ENTITY_TYPE);
pub const UPDATE_TRAINING: Operation = Operation::update(Training::ENTITY_TYPE);
pub const DELETE_TRAINING: Operation = Operation::delete(Training::ENTITY_TYPE);

/// Current-state loader for trainings
pub fn load(tx: &Transaction<'_>, id: i64) -> TrailResult<Option<Training>> {
    tx.get(id)
}

/// Requested changes to a training; an empty description clears it
#[derive(Debug, Clone, Default)]
pub struct TrainingUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub expected_version: Option<i32>,
}

/// Service for training course management
pub struct TrainingService<'a> {
    auditor: &'a Auditor,
}

impl<'a> TrainingService<'a> {
    pub fn new(auditor: &'a Auditor) -> Self {
        Self { auditor }
    }

    /// Create a new training
    pub fn create(
        &self,
        name: &str,
        description: Option<&str>,
        initiator: Option<&str>,
    ) -> TrailResult<Training> {
        let name = required(name, "Training name")?;
        let description = description.and_then(optional);

        self.auditor.create(&CREATE_TRAINING, initiator, |tx| {
            let mut training = Training::new(name, description);
            training.updated_by = initiator.map(String::from);
            training.validate().map_err(TrailError::Validation)?;
            tx.insert(training)
        })
    }

    /// Apply changes to an existing training
    pub fn update(
        &self,
        id: i64,
        changes: TrainingUpdate,
        initiator: Option<&str>,
    ) -> TrailResult<Training> {
        self.auditor.update(&UPDATE_TRAINING, id, initiator, |tx| {
            let mut training: Training = tx.require(id)?;
            check_version(&training, changes.expected_version)?;

            if let Some(name) = changes.name {
                training.name = required(&name, "Training name")?;
            }
            if let Some(description) = changes.description {
                training.description = optional(&description);
            }
            if let Some(who) = initiator {
                training.updated_by = Some(who.to_string());
            }
            tx.update(training)
        })
    }

    /// Delete a training nobody is enrolled in
    pub fn delete(&self, id: i64, initiator: Option<&str>) -> TrailResult<()> {
        self.auditor
            .delete::<Training, _, _>(&DELETE_TRAINING, id, initiator, |tx| {
                let enrolled = tx.filter(|e: &EmployeeTraining| e.training_id == id)?;
                if !enrolled.is_empty() {
                    return Err(TrailError::Validation(format!(
                        "Training {} still has {} enrollment(s)",
                        id,
                        enrolled.len()
                    )));
                }

                tx.delete::<Training>(id)?;
                Ok(())
            })
    }

    pub fn get(&self, id: i64) -> TrailResult<Option<Training>> {
        self.auditor.storage().trainings.get(id)
    }

    pub fn list(&self) -> TrailResult<Vec<Training>> {
        self.auditor.storage().trainings.get_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::EventStore;
    use crate::services::test_support::create_test_auditor;

    #[test]
    fn test_clearing_description_is_recorded() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = TrainingService::new(&auditor);

        let training = service.create("Rust", Some("Ownership basics"), None).unwrap();
        service
            .update(
                training.id.unwrap(),
                TrainingUpdate {
                    description: Some(String::new()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        let event = &events.list_all().unwrap()[0];
        assert_eq!(
            event.summary,
            "TRAINING updated: description (from 'Ownership basics' to 'null')"
        );
    }

    #[test]
    fn test_delete_training() {
        let (_temp_dir, auditor, _events) = create_test_auditor();
        let service = TrainingService::new(&auditor);
        let training = service.create("Rust", None, None).unwrap();

        service.delete(training.id.unwrap(), None).unwrap();
        assert!(service.get(training.id.unwrap()).unwrap().is_none());
        assert!(service.delete(training.id.unwrap(), None).unwrap_err().is_not_found());
    }
}
