//! Storage layer for audit-trail
//!
//! Provides JSON file storage for the entity tables with atomic writes, a
//! single-writer lock, and [`Transaction`] as the unit of work that keeps
//! table changes and their audit event together.

pub mod file_io;
pub mod init;
pub mod repository;
pub mod transaction;

pub use init::initialize_storage;
pub use repository::EntityRepository;
pub use transaction::Transaction;

use std::sync::Mutex;

use crate::config::paths::AuditPaths;
use crate::error::TrailError;
use crate::models::{Address, Department, Employee, EmployeeTraining, Entity, Training};

/// An entity type with a table in [`Storage`]
pub trait Stored: Entity {
    fn repository(storage: &Storage) -> &EntityRepository<Self>;
}

impl Stored for Employee {
    fn repository(storage: &Storage) -> &EntityRepository<Self> {
        &storage.employees
    }
}

impl Stored for Department {
    fn repository(storage: &Storage) -> &EntityRepository<Self> {
        &storage.departments
    }
}

impl Stored for Address {
    fn repository(storage: &Storage) -> &EntityRepository<Self> {
        &storage.addresses
    }
}

impl Stored for Training {
    fn repository(storage: &Storage) -> &EntityRepository<Self> {
        &storage.trainings
    }
}

impl Stored for EmployeeTraining {
    fn repository(storage: &Storage) -> &EntityRepository<Self> {
        &storage.enrollments
    }
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: AuditPaths,
    pub employees: EntityRepository<Employee>,
    pub departments: EntityRepository<Department>,
    pub addresses: EntityRepository<Address>,
    pub trainings: EntityRepository<Training>,
    pub enrollments: EntityRepository<EmployeeTraining>,
    write_lock: Mutex<()>,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: AuditPaths) -> Result<Self, TrailError> {
        paths.ensure_directories()?;

        Ok(Self {
            employees: EntityRepository::new(paths.table_file(Employee::ENTITY_TYPE)),
            departments: EntityRepository::new(paths.table_file(Department::ENTITY_TYPE)),
            addresses: EntityRepository::new(paths.table_file(Address::ENTITY_TYPE)),
            trainings: EntityRepository::new(paths.table_file(Training::ENTITY_TYPE)),
            enrollments: EntityRepository::new(paths.table_file(EmployeeTraining::ENTITY_TYPE)),
            paths,
            write_lock: Mutex::new(()),
        })
    }

    /// Create a Storage instance and load every table
    pub fn open(paths: AuditPaths) -> Result<Self, TrailError> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &AuditPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), TrailError> {
        self.employees.load()?;
        self.departments.load()?;
        self.addresses.load()?;
        self.trainings.load()?;
        self.enrollments.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), TrailError> {
        self.employees.save()?;
        self.departments.save()?;
        self.addresses.save()?;
        self.trainings.save()?;
        self.enrollments.save()?;
        Ok(())
    }

    /// Save the table holding `entity_type`
    pub fn save_table(&self, entity_type: &str) -> Result<(), TrailError> {
        match entity_type {
            Employee::ENTITY_TYPE => self.employees.save(),
            Department::ENTITY_TYPE => self.departments.save(),
            Address::ENTITY_TYPE => self.addresses.save(),
            Training::ENTITY_TYPE => self.trainings.save(),
            EmployeeTraining::ENTITY_TYPE => self.enrollments.save(),
            other => Err(TrailError::Storage(format!("Unknown table: {}", other))),
        }
    }

    /// Start a unit of work, waiting for any other writer to finish
    pub fn begin(&self) -> Result<Transaction<'_>, TrailError> {
        let guard = self
            .write_lock
            .lock()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        Ok(Transaction::new(self, guard))
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}
