//! Training enrollment service
//!
//! Allocates employees to trainings and tracks enrollment status.

use chrono::NaiveDate;

use crate::audit::{Auditor, Operation};
use crate::error::{TrailError, TrailResult};
use crate::models::{Employee, EmployeeTraining, Entity, Training, TrainingStatus};
use crate::storage::Transaction;

use super::check_version;

pub const CREATE_ENROLLMENT: Operation = Operation::create(EmployeeTraining::ENTITY_TYPE);
pub const UPDATE_ENROLLMENT: Operation = Operation::update(EmployeeTraining::ENTITY_TYPE);
pub const DELETE_ENROLLMENT: Operation = Operation::delete(EmployeeTraining::ENTITY_TYPE);

/// Current-state loader for enrollments
pub fn load(tx: &Transaction<'_>, id: i64) -> TrailResult<Option<EmployeeTraining>> {
    tx.get(id)
}

/// Requested changes to an enrollment
#[derive(Debug, Clone, Default)]
pub struct EnrollmentUpdate {
    pub status: Option<TrainingStatus>,
    pub date_of_allocation: Option<NaiveDate>,
    pub expected_version: Option<i32>,
}

/// Service for training enrollments
pub struct EnrollmentService<'a> {
    auditor: &'a Auditor,
}

impl<'a> EnrollmentService<'a> {
    pub fn new(auditor: &'a Auditor) -> Self {
        Self { auditor }
    }

    /// Enroll an employee in a training
    ///
    /// Status starts as ALLOCATED and the allocation date defaults to today.
    pub fn assign(
        &self,
        emp_id: i64,
        training_id: i64,
        date_of_allocation: Option<NaiveDate>,
        initiator: Option<&str>,
    ) -> TrailResult<EmployeeTraining> {
        self.auditor.create(&CREATE_ENROLLMENT, initiator, |tx| {
            ensure_references(tx, emp_id, training_id)?;

            let duplicate = tx.find(|e: &EmployeeTraining| {
                e.emp_id == emp_id
                    && e.training_id == training_id
                    && e.status != TrainingStatus::Cancelled
            })?;
            if duplicate.is_some() {
                return Err(TrailError::Duplicate {
                    entity_type: EmployeeTraining::ENTITY_TYPE,
                    identifier: format!("employee {} in training {}", emp_id, training_id),
                });
            }

            let mut enrollment = EmployeeTraining::new(emp_id, training_id);
            if date_of_allocation.is_some() {
                enrollment.date_of_allocation = date_of_allocation;
            }
            enrollment.updated_by = initiator.map(String::from);
            tx.insert(enrollment)
        })
    }

    /// Apply changes to an enrollment
    pub fn update(
        &self,
        id: i64,
        changes: EnrollmentUpdate,
        initiator: Option<&str>,
    ) -> TrailResult<EmployeeTraining> {
        self.auditor.update(&UPDATE_ENROLLMENT, id, initiator, |tx| {
            let mut enrollment: EmployeeTraining = tx.require(id)?;
            check_version(&enrollment, changes.expected_version)?;

            if let Some(status) = changes.status {
                enrollment.status = status;
            }
            if let Some(date) = changes.date_of_allocation {
                enrollment.date_of_allocation = Some(date);
            }
            if let Some(who) = initiator {
                enrollment.updated_by = Some(who.to_string());
            }
            tx.update(enrollment)
        })
    }

    /// Change only the status of an enrollment
    pub fn set_status(
        &self,
        id: i64,
        status: TrainingStatus,
        initiator: Option<&str>,
    ) -> TrailResult<EmployeeTraining> {
        self.update(
            id,
            EnrollmentUpdate {
                status: Some(status),
                ..Default::default()
            },
            initiator,
        )
    }

    pub fn delete(&self, id: i64, initiator: Option<&str>) -> TrailResult<()> {
        self.auditor
            .delete::<EmployeeTraining, _, _>(&DELETE_ENROLLMENT, id, initiator, |tx| {
                tx.delete::<EmployeeTraining>(id)?;
                Ok(())
            })
    }

    pub fn get(&self, id: i64) -> TrailResult<Option<EmployeeTraining>> {
        self.auditor.storage().enrollments.get(id)
    }

    pub fn list(&self) -> TrailResult<Vec<EmployeeTraining>> {
        self.auditor.storage().enrollments.get_all()
    }

    /// Enrollments of one employee
    pub fn list_for_employee(&self, emp_id: i64) -> TrailResult<Vec<EmployeeTraining>> {
        self.auditor
            .storage()
            .enrollments
            .filter(|e| e.emp_id == emp_id)
    }
}

fn ensure_references(tx: &Transaction<'_>, emp_id: i64, training_id: i64) -> TrailResult<()> {
    if !tx.exists::<Employee>(emp_id)? {
        return Err(TrailError::Validation(format!(
            "Employee {} does not exist",
            emp_id
        )));
    }
    if !tx.exists::<Training>(training_id)? {
        return Err(TrailError::Validation(format!(
            "Training {} does not exist",
            training_id
        )));
    }
    Ok(())
}
