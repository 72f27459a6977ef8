//! Training course model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A training course employees can be enrolled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub created_timestamp: DateTime<Utc>,
    pub updated_timestamp: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub version: i32,
}

impl_entity!(Training, "TRAINING");

impl Training {
    /// Create a new, unsaved training
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            description,
            created_timestamp: now,
            updated_timestamp: now,
            updated_by: None,
            version: 0,
        }
    }

    /// Validate the training
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Training name cannot be empty".into());
        }
        Ok(())
    }
}
