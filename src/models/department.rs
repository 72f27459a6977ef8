//! Department model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An organizational department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Option<i64>,
    pub name: String,
    pub created_timestamp: DateTime<Utc>,
    pub updated_timestamp: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub version: i32,
}

impl_entity!(Department, "DEPARTMENT");

impl Department {
    /// Create a new, unsaved department
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            created_timestamp: now,
            updated_timestamp: now,
            updated_by: None,
            version: 0,
        }
    }

    /// Validate the department
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Department name cannot be empty".into());
        }
        Ok(())
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
