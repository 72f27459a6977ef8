//! Department service

use crate::audit::{Auditor, Operation};
use crate::error::{TrailError, TrailResult};
use crate::models::{Department, Employee, Entity};
use crate::storage::Transaction;

use super::{check_version, required};

pub const CREATE_DEPARTMENT: Operation = Operation::create(Department::ENTITY_TYPE);
pub const UPDATE_DEPARTMENT: Operation = Operation::update(Department::ENTITY_TYPE);
pub const DELETE_DEPARTMENT: Operation = Operation::delete(Department::ENTITY_TYPE);

/// Current-state loader for departments
pub fn load(tx: &Transaction<'_>, id: i64) -> TrailResult<Option<Department>> {
    tx.get(id)
}

/// Service for department management
pub struct DepartmentService<'a> {
    auditor: &'a Auditor,
}

impl<'a> DepartmentService<'a> {
    pub fn new(auditor: &'a Auditor) -> Self {
        Self { auditor }
    }

    /// Create a new department
    pub fn create(&self, name: &str, initiator: Option<&str>) -> TrailResult<Department> {
        let name = required(name, "Department name")?;

        self.auditor.create(&CREATE_DEPARTMENT, initiator, |tx| {
            let mut department = Department::new(name);
            department.updated_by = initiator.map(String::from);
            department.validate().map_err(TrailError::Validation)?;
            tx.insert(department)
        })
    }

    /// Rename a department
    pub fn rename(
        &self,
        id: i64,
        name: &str,
        expected_version: Option<i32>,
        initiator: Option<&str>,
    ) -> TrailResult<Department> {
        let name = required(name, "Department name")?;

        self.auditor.update(&UPDATE_DEPARTMENT, id, initiator, |tx| {
            let mut department: Department = tx.require(id)?;
            check_version(&department, expected_version)?;

            department.name = name;
            if let Some(who) = initiator {
                department.updated_by = Some(who.to_string());
            }
            tx.update(department)
        })
    }

    /// Delete a department no employee belongs to
    pub fn delete(&self, id: i64, initiator: Option<&str>) -> TrailResult<()> {
        self.auditor
            .delete::<Department, _, _>(&DELETE_DEPARTMENT, id, initiator, |tx| {
                let members = tx.filter(|e: &Employee| e.department_id == Some(id))?;
                if !members.is_empty() {
                    return Err(TrailError::Validation(format!(
                        "Department {} still has {} employee(s)",
                        id,
                        members.len()
                    )));
                }

                tx.delete::<Department>(id)?;
                Ok(())
            })
    }

    pub fn get(&self, id: i64) -> TrailResult<Option<Department>> {
        self.auditor.storage().departments.get(id)
    }

    pub fn list(&self) -> TrailResult<Vec<Department>> {
        self.auditor.storage().departments.get_all()
    }
}
