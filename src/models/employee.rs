//! Employee model
//!
//! The primary audited entity of the HR domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An employee record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identifier, assigned on insert
    pub id: Option<i64>,

    pub first_name: String,

    pub last_name: String,

    /// Work email, unique across employees
    pub email: String,

    pub phone: Option<String>,

    /// Owning department, if any
    pub department_id: Option<i64>,

    /// Home address, if any
    pub address_id: Option<i64>,

    /// When the employee was created
    pub created_timestamp: DateTime<Utc>,

    /// When the employee was last modified
    pub updated_timestamp: DateTime<Utc>,

    /// Who last modified the employee
    pub updated_by: Option<String>,

    /// Optimistic-concurrency version
    pub version: i32,
}

impl_entity!(Employee, "EMPLOYEE");

impl Employee {
    /// Create a new, unsaved employee
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            department_id: None,
            address_id: None,
            created_timestamp: now,
            updated_timestamp: now,
            updated_by: None,
            version: 0,
        }
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Treat a foreign key of 0 as "no reference"
    pub fn normalize_references(&mut self) {
        if self.department_id == Some(0) {
            self.department_id = None;
        }
        if self.address_id == Some(0) {
            self.address_id = None;
        }
    }

    /// Validate the employee
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(EmployeeValidationError::MissingFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(EmployeeValidationError::MissingLastName);
        }

        let email = self.email.trim();
        if email.is_empty() {
            return Err(EmployeeValidationError::MissingEmail);
        }
        if !email.contains('@') {
            return Err(EmployeeValidationError::InvalidEmail(email.to_string()));
        }

        Ok(())
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.full_name(), self.email)
    }
}

/// Validation errors for employees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    MissingFirstName,
    MissingLastName,
    MissingEmail,
    InvalidEmail(String),
}

impl fmt::Display for EmployeeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFirstName => write!(f, "First name is required"),
            Self::MissingLastName => write!(f, "Last name is required"),
            Self::MissingEmail => write!(f, "Email is required"),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
        }
    }
}

impl std::error::Error for EmployeeValidationError {}
