//! Employee training enrollment model
//!
//! Links an employee to a training course and tracks its progress.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of an enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingStatus {
    #[default]
    Allocated,
    InProgress,
    Completed,
    Cancelled,
}

impl TrainingStatus {
    /// Parse a status from user input (case-insensitive, `-` or `_`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ALLOCATED" => Some(Self::Allocated),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocated => write!(f, "ALLOCATED"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// An employee's enrollment in a training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeTraining {
    pub id: Option<i64>,
    pub emp_id: i64,
    pub training_id: i64,
    pub date_of_allocation: Option<NaiveDate>,
    pub status: TrainingStatus,
    pub created_timestamp: DateTime<Utc>,
    pub updated_timestamp: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub version: i32,
}

impl_entity!(EmployeeTraining, "EMPLOYEE_TRAINING");

impl EmployeeTraining {
    /// Create a new, unsaved enrollment allocated today
    pub fn new(emp_id: i64, training_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            emp_id,
            training_id,
            date_of_allocation: Some(now.date_naive()),
            status: TrainingStatus::Allocated,
            created_timestamp: now,
            updated_timestamp: now,
            updated_by: None,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!(
            TrainingStatus::parse("in-progress"),
            Some(TrainingStatus::InProgress)
        );
        assert_eq!(TrainingStatus::parse("done"), None);
        assert_eq!(TrainingStatus::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&TrainingStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }

    #[test]
    fn test_new_enrollment_defaults() {
        let enrollment = EmployeeTraining::new(1, 2);
        assert_eq!(enrollment.status, TrainingStatus::Allocated);
        assert!(enrollment.date_of_allocation.is_some());
    }
}
