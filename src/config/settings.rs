//! User settings for audit-trail
//!
//! Manages the audit defaults: recording domain, fallback initiator, the
//! metadata field set hidden from summaries, and append retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::AuditPaths;
use crate::audit::diff::MetadataFields;
use crate::audit::retry::RetryConfig;
use crate::error::TrailError;

/// Retry policy for event store appends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Backoff cap, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 25,
            max_delay_ms: 250,
        }
    }
}

impl RetrySettings {
    /// Convert into the runtime retry configuration
    pub fn to_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// User settings for audit-trail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Domain recorded on events
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Initiator recorded when neither the caller nor the entity names one
    #[serde(default = "default_initiator")]
    pub default_initiator: String,

    /// Fields treated as metadata and left out of summaries
    #[serde(default = "default_metadata_fields")]
    pub metadata_fields: Vec<String>,

    /// Append retry policy
    #[serde(default)]
    pub retry: RetrySettings,

    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_domain() -> String {
    "HR".to_string()
}

fn default_initiator() -> String {
    "SYSTEM".to_string()
}

fn default_metadata_fields() -> Vec<String> {
    ["id", "createdTimestamp", "updatedTimestamp", "version"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            domain: default_domain(),
            default_initiator: default_initiator(),
            metadata_fields: default_metadata_fields(),
            retry: RetrySettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Metadata field set used when summarizing updates
    pub fn metadata(&self) -> MetadataFields {
        MetadataFields::new(self.metadata_fields.iter().cloned())
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, TrailError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| TrailError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                TrailError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), TrailError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TrailError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| TrailError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
