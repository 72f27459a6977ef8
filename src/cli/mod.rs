//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod address;
pub mod audit;
pub mod department;
pub mod employee;
pub mod enrollment;
pub mod training;

pub use address::{handle_address_command, AddressCommands};
pub use audit::{handle_audit_command, AuditCommands};
pub use department::{handle_department_command, DepartmentCommands};
pub use employee::{handle_employee_command, EmployeeCommands};
pub use enrollment::{handle_enrollment_command, EnrollmentCommands};
pub use training::{handle_training_command, TrainingCommands};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{TrailError, TrailResult};
use crate::models::TrainingStatus;

/// Normalize a user-typed entity type (`employee` -> `EMPLOYEE`)
pub(crate) fn entity_type(s: &str) -> String {
    s.trim().to_uppercase().replace('-', "_")
}

pub(crate) fn parse_date(s: &str) -> TrailResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| TrailError::Validation(format!("Invalid date '{}' (expected YYYY-MM-DD)", s)))
}

/// Parse an RFC 3339 timestamp or a bare date
///
/// A bare date means the start of that day, or its last instant when
/// `end_of_day` is set.
pub(crate) fn parse_timestamp(s: &str, end_of_day: bool) -> TrailResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s.trim()) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = parse_date(s)?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| TrailError::Validation(format!("Invalid timestamp '{}'", s)))?;

    Ok(date.and_time(time).and_utc())
}

pub(crate) fn parse_status(s: &str) -> TrailResult<TrainingStatus> {
    TrainingStatus::parse(s).ok_or_else(|| {
        TrailError::Validation(format!(
            "Unknown status '{}' (expected allocated, in-progress, completed or cancelled)",
            s
        ))
    })
}
