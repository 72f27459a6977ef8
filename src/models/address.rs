//! Address model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A postal address an employee can reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Option<i64>,

    #[serde(rename = "addressLine1")]
    pub address_line_1: String,

    #[serde(rename = "addressLine2")]
    pub address_line_2: Option<String>,

    #[serde(rename = "addressLine3")]
    pub address_line_3: Option<String>,

    pub country: String,

    pub postal_code: Option<String>,

    pub created_timestamp: DateTime<Utc>,
    pub updated_timestamp: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub version: i32,
}

impl_entity!(Address, "ADDRESS");

impl Address {
    /// Create a new, unsaved address
    pub fn new(address_line_1: impl Into<String>, country: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            address_line_1: address_line_1.into(),
            address_line_2: None,
            address_line_3: None,
            country: country.into(),
            postal_code: None,
            created_timestamp: now,
            updated_timestamp: now,
            updated_by: None,
            version: 0,
        }
    }

    /// Validate the address
    pub fn validate(&self) -> Result<(), String> {
        if self.address_line_1.trim().is_empty() {
            return Err("Address line 1 is required".into());
        }
        if self.country.trim().is_empty() {
            return Err("Country is required".into());
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_line_1)?;
        for line in [&self.address_line_2, &self.address_line_3].into_iter().flatten() {
            write!(f, ", {}", line)?;
        }
        if let Some(postal_code) = &self.postal_code {
            write!(f, ", {}", postal_code)?;
        }
        write!(f, ", {}", self.country)
    }
}
