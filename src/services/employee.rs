//! Employee service
//!
//! Provides business logic for employee management: validation, email
//! uniqueness and department/address reference checks.

use crate::audit::{Auditor, Operation};
use crate::error::{TrailError, TrailResult};
use crate::models::{Address, Department, Employee, EmployeeTraining, Entity};
use crate::storage::Transaction;

use super::{check_version, optional};

pub const CREATE_EMPLOYEE: Operation = Operation::create(Employee::ENTITY_TYPE);
pub const UPDATE_EMPLOYEE: Operation = Operation::update(Employee::ENTITY_TYPE);
pub const DELETE_EMPLOYEE: Operation = Operation::delete(Employee::ENTITY_TYPE);

/// Current-state loader for employees
pub fn load(tx: &Transaction<'_>, id: i64) -> TrailResult<Option<Employee>> {
    tx.get(id)
}

/// Requested changes to an employee; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// An empty string clears the phone number
    pub phone: Option<String>,
    /// `0` clears the department
    pub department_id: Option<i64>,
    /// `0` clears the address
    pub address_id: Option<i64>,
    /// Version the caller last saw
    pub expected_version: Option<i32>,
}

/// Service for employee management
pub struct EmployeeService<'a> {
    auditor: &'a Auditor,
}

impl<'a> EmployeeService<'a> {
    /// Create a new employee service
    pub fn new(auditor: &'a Auditor) -> Self {
        Self { auditor }
    }

    /// Create a new employee
    pub fn create(&self, employee: Employee, initiator: Option<&str>) -> TrailResult<Employee> {
        self.auditor.create(&CREATE_EMPLOYEE, initiator, |tx| {
            let mut employee = employee;
            employee.first_name = employee.first_name.trim().to_string();
            employee.last_name = employee.last_name.trim().to_string();
            employee.email = employee.email.trim().to_string();
            employee.phone = employee.phone.as_deref().and_then(optional);
            employee.normalize_references();
            if let Some(who) = initiator {
                employee.updated_by = Some(who.to_string());
            }

            employee
                .validate()
                .map_err(|e| TrailError::Validation(e.to_string()))?;
            ensure_email_free(tx, &employee.email, None)?;
            ensure_references(tx, &employee)?;

            tx.insert(employee)
        })
    }

    /// Apply changes to an existing employee
    pub fn update(
        &self,
        id: i64,
        changes: EmployeeUpdate,
        initiator: Option<&str>,
    ) -> TrailResult<Employee> {
        self.auditor.update(&UPDATE_EMPLOYEE, id, initiator, |tx| {
            let mut employee: Employee = tx.require(id)?;
            check_version(&employee, changes.expected_version)?;

            if let Some(first_name) = changes.first_name {
                employee.first_name = first_name.trim().to_string();
            }
            if let Some(last_name) = changes.last_name {
                employee.last_name = last_name.trim().to_string();
            }
            if let Some(email) = changes.email {
                employee.email = email.trim().to_string();
            }
            if let Some(phone) = changes.phone {
                employee.phone = optional(&phone);
            }
            if let Some(department_id) = changes.department_id {
                employee.department_id = Some(department_id);
            }
            if let Some(address_id) = changes.address_id {
                employee.address_id = Some(address_id);
            }
            employee.normalize_references();
            if let Some(who) = initiator {
                employee.updated_by = Some(who.to_string());
            }

            employee
                .validate()
                .map_err(|e| TrailError::Validation(e.to_string()))?;
            ensure_email_free(tx, &employee.email, Some(id))?;
            ensure_references(tx, &employee)?;

            tx.update(employee)
        })
    }

    /// Delete an employee with no training enrollments
    pub fn delete(&self, id: i64, initiator: Option<&str>) -> TrailResult<()> {
        self.auditor
            .delete::<Employee, _, _>(&DELETE_EMPLOYEE, id, initiator, |tx| {
                let enrollments: Vec<EmployeeTraining> = tx.filter(|e: &EmployeeTraining| e.emp_id == id)?;
                if !enrollments.is_empty() {
                    return Err(TrailError::Validation(format!(
                        "Employee {} still has {} training enrollment(s)",
                        id,
                        enrollments.len()
                    )));
                }

                tx.delete::<Employee>(id)?;
                Ok(())
            })
    }

    /// Get an employee by id
    pub fn get(&self, id: i64) -> TrailResult<Option<Employee>> {
        self.auditor.storage().employees.get(id)
    }

    /// Find an employee by email (case-insensitive)
    pub fn find_by_email(&self, email: &str) -> TrailResult<Option<Employee>> {
        let email = email.trim().to_lowercase();
        self.auditor
            .storage()
            .employees
            .find(|e| e.email.to_lowercase() == email)
    }

    /// All employees, ordered by id
    pub fn list(&self) -> TrailResult<Vec<Employee>> {
        self.auditor.storage().employees.get_all()
    }

    /// Employees in a department
    pub fn list_by_department(&self, department_id: i64) -> TrailResult<Vec<Employee>> {
        self.auditor
            .storage()
            .employees
            .filter(|e| e.department_id == Some(department_id))
    }
}

fn ensure_email_free(tx: &Transaction<'_>, email: &str, exclude_id: Option<i64>) -> TrailResult<()> {
    let email_lower = email.to_lowercase();
    let taken = tx.find(|e: &Employee| e.email.to_lowercase() == email_lower && e.id != exclude_id)?;
    if taken.is_some() {
        return Err(TrailError::Duplicate {
            entity_type: Employee::ENTITY_TYPE,
            identifier: email.to_string(),
        });
    }
    Ok(())
}

fn ensure_references(tx: &Transaction<'_>, employee: &Employee) -> TrailResult<()> {
    if let Some(department_id) = employee.department_id {
        if !tx.exists::<Department>(department_id)? {
            return Err(TrailError::Validation(format!(
                "Department {} does not exist",
                department_id
            )));
        }
    }
    if let Some(address_id) = employee.address_id {
        if !tx.exists::<Address>(address_id)? {
            return Err(TrailError::Validation(format!(
                "Address {} does not exist",
                address_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{
        AuditEvent, EventKind, EventStore, LoaderRegistry, MemoryEventStore, UpdatePayload,
    };
    use crate::config::paths::AuditPaths;
    use crate::config::Settings;
    use crate::services::test_support::create_test_auditor;
    use crate::services::{register_loaders, DepartmentService};
    use crate::storage::Storage;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    /// Store whose appends can be made to fail on demand
    #[derive(Default)]
    struct SwitchableStore {
        inner: MemoryEventStore,
        failing: AtomicBool,
    }

    impl EventStore for SwitchableStore {
        fn append(&self, event: &AuditEvent) -> TrailResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(TrailError::Io("event log unavailable".into()));
            }
            self.inner.append(event)
        }

        fn read_all(&self) -> TrailResult<Vec<AuditEvent>> {
            self.inner.read_all()
        }
    }

    fn jane() -> Employee {
        Employee::new("Jane", "Doe", "jane.doe@x.com")
    }

    fn rename_jane() -> EmployeeUpdate {
        EmployeeUpdate {
            last_name: Some("Smith".into()),
            email: Some("jane.smith@x.com".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_employee_records_one_created_event() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);

        let employee = service.create(jane(), None).unwrap();

        let recorded = events.list_all().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].event_kind, EventKind::Created);
        assert_eq!(recorded[0].entity_version, 1);
        assert_eq!(recorded[0].entity_id, employee.id);
        assert_eq!(recorded[0].payload, serde_json::to_value(&employee).unwrap());
        assert_eq!(recorded[0].summary, "EMPLOYEE created");
    }

    #[test]
    fn test_update_employee_records_changed_fields() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);
        let id = service.create(jane(), None).unwrap().id.unwrap();

        let updated = service.update(id, rename_jane(), None).unwrap();
        assert_eq!(updated.version, 2);

        let recorded = events.by_event_kind(EventKind::Updated).unwrap();
        assert_eq!(recorded.len(), 1);
        let event = &recorded[0];
        assert_eq!(event.entity_version, 2);

        let payload: UpdatePayload = serde_json::from_value(event.payload.clone()).unwrap();
        let changed: Vec<&str> = payload
            .changes
            .iter()
            .map(|c| c.field_name.as_str())
            .filter(|name| !["updatedTimestamp", "version"].contains(name))
            .collect();
        assert_eq!(changed, vec!["lastName", "email"]);
        assert_eq!(payload.old_value["lastName"], json!("Doe"));
        assert_eq!(payload.new_value["email"], json!("jane.smith@x.com"));

        assert_eq!(
            event.summary,
            "EMPLOYEE updated: lastName (from 'Doe' to 'Smith'), email (from 'jane.doe@x.com' to 'jane.smith@x.com')"
        );
    }

    #[test]
    fn test_update_without_differences_reports_no_changes() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);
        let created = service.create(jane(), None).unwrap();

        let same = service
            .update(
                created.id.unwrap(),
                EmployeeUpdate {
                    last_name: Some("Doe".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(same, created);

        let event = &events.list_all().unwrap()[0];
        assert_eq!(event.event_kind, EventKind::Updated);
        assert_eq!(event.summary, "EMPLOYEE updated - no changes detected");
        assert_eq!(event.payload["changes"], json!({}));
        assert_eq!(event.entity_version, 1);
    }

    #[test]
    fn test_delete_employee_records_snapshot() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);
        let id = service.create(jane(), None).unwrap().id.unwrap();
        let before_delete = service.update(id, rename_jane(), None).unwrap();

        service.delete(id, Some("hr-admin")).unwrap();
        assert!(service.get(id).unwrap().is_none());

        let deleted = events.by_event_kind(EventKind::Deleted).unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].payload, serde_json::to_value(&before_delete).unwrap());
        assert_eq!(deleted[0].entity_version, 2);
        assert_eq!(deleted[0].initiator, "hr-admin");
    }

    #[test]
    fn test_field_history_follows_history_order() {
        let (_temp_dir, auditor, _events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);
        let id = service.create(jane(), None).unwrap().id.unwrap();

        service.update(id, rename_jane(), None).unwrap();
        service
            .update(
                id,
                EmployeeUpdate {
                    phone: Some("555-0100".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        service
            .update(
                id,
                EmployeeUpdate {
                    email: Some("j.smith@x.com".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        let history = auditor.history();
        let timeline = history.history(id).unwrap();
        let expected: Vec<_> = timeline
            .iter()
            .filter(|entry| entry.event_kind == EventKind::Updated)
            .filter_map(|entry| {
                entry
                    .changes
                    .as_ref()
                    .and_then(|changes| changes.iter().find(|c| c.field_name == "email"))
                    .cloned()
            })
            .collect();

        let emails = history.field_history(id, "email").unwrap();
        assert_eq!(emails, expected);
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].new_value, json!("j.smith@x.com"));
        assert_eq!(emails[1].old_value, json!("jane.doe@x.com"));
    }

    #[test]
    fn test_failed_append_rolls_back_update() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Arc::new(SwitchableStore::default());
        let mut loaders = LoaderRegistry::new();
        register_loaders(&mut loaders);
        let auditor = Auditor::new(
            Storage::new(paths.clone()).unwrap(),
            store.clone(),
            loaders,
            &Settings::default(),
        );
        let service = EmployeeService::new(&auditor);
        let original = service.create(jane(), None).unwrap();
        let id = original.id.unwrap();

        store.failing.store(true, Ordering::SeqCst);
        let err = service.update(id, rename_jane(), None).unwrap_err();
        assert!(err.is_audit_failure());

        let err = service.create(Employee::new("John", "Roe", "john@x.com"), None).unwrap_err();
        assert!(err.is_audit_failure());

        assert_eq!(service.get(id).unwrap(), Some(original.clone()));
        assert_eq!(service.list().unwrap().len(), 1);
        assert_eq!(store.count().unwrap(), 1);

        let reloaded = Storage::open(paths).unwrap();
        assert_eq!(reloaded.employees.get(id).unwrap(), Some(original));
        assert_eq!(reloaded.employees.count().unwrap(), 1);
    }

    #[test]
    fn test_business_failure_leaves_no_event() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);
        service.create(jane(), None).unwrap();

        let err = service
            .create(Employee::new("Janet", "Doe", "JANE.DOE@x.com"), None)
            .unwrap_err();
        assert!(matches!(err, TrailError::Duplicate { .. }));

        let err = service.update(42, rename_jane(), None).unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(events.count().unwrap(), 1);
    }

    #[test]
    fn test_validation_and_references() {
        let (_temp_dir, auditor, _events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);

        let err = service
            .create(Employee::new("Jane", "Doe", "no-at-sign"), None)
            .unwrap_err();
        assert!(err.is_validation());

        let mut missing_department = jane();
        missing_department.department_id = Some(9);
        assert!(service.create(missing_department, None).unwrap_err().is_validation());

        let department = DepartmentService::new(&auditor)
            .create("Engineering", None)
            .unwrap();
        let mut placed = jane();
        placed.department_id = department.id;
        placed.address_id = Some(0);
        let created = service.create(placed, None).unwrap();
        assert_eq!(created.department_id, department.id);
        assert_eq!(created.address_id, None);

        let moved = service
            .update(
                created.id.unwrap(),
                EmployeeUpdate {
                    department_id: Some(0),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(moved.department_id, None);
        assert_eq!(service.list_by_department(department.id.unwrap()).unwrap().len(), 0);
    }

    #[test]
    fn test_expected_version_mismatch() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);
        let id = service.create(jane(), None).unwrap().id.unwrap();
        service.update(id, rename_jane(), None).unwrap();

        let stale = EmployeeUpdate {
            first_name: Some("Janet".into()),
            expected_version: Some(1),
            ..Default::default()
        };
        let err = service.update(id, stale, None).unwrap_err();
        assert!(matches!(
            err,
            TrailError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert_eq!(events.count().unwrap(), 2);
    }

    #[test]
    fn test_initiator_recorded_from_entity() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let service = EmployeeService::new(&auditor);

        let created = service.create(jane(), Some("alice")).unwrap();
        assert_eq!(created.updated_by.as_deref(), Some("alice"));
        assert_eq!(events.by_initiator("alice").unwrap().len(), 1);

        service.update(created.id.unwrap(), rename_jane(), None).unwrap();
        assert_eq!(events.by_initiator("alice").unwrap().len(), 2);
        assert_eq!(service.find_by_email("JANE.SMITH@x.com").unwrap().unwrap().id, created.id);
    }

    #[test]
    fn test_concurrent_updates_are_isolated() {
        let (_temp_dir, auditor, events) = create_test_auditor();
        let auditor = Arc::new(auditor);
        let id = EmployeeService::new(&auditor)
            .create(jane(), None)
            .unwrap()
            .id
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let auditor = Arc::clone(&auditor);
                thread::spawn(move || {
                    let worker = format!("worker-{}", n);
                    EmployeeService::new(&auditor)
                        .update(
                            id,
                            EmployeeUpdate {
                                phone: Some(format!("555-010{}", n)),
                                ..Default::default()
                            },
                            Some(worker.as_str()),
                        )
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let updates = events.by_event_kind(EventKind::Updated).unwrap();
        assert_eq!(updates.len(), 8);

        let mut versions: Vec<i32> = updates.iter().map(|e| e.entity_version).collect();
        versions.sort_unstable();
        assert_eq!(versions, (2..=9).collect::<Vec<_>>());

        // Each event's pre-state is exactly the previous event's post-state
        let mut chain: Vec<UpdatePayload> = updates
            .iter()
            .map(|e| serde_json::from_value(e.payload.clone()).unwrap())
            .collect();
        chain.sort_by_key(|p| p.new_value["version"].as_i64());
        for pair in chain.windows(2) {
            assert_eq!(pair[0].new_value, pair[1].old_value);
        }
    }
}
