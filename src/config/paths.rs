//! Path management for audit-trail
//!
//! Provides XDG-compliant path resolution for configuration, entity data,
//! and the audit event log.
//!
//! ## Path Resolution Order
//!
//! 1. `AUDIT_TRAIL_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/audit-trail` or `~/.config/audit-trail`
//! 3. Windows: `%APPDATA%\audit-trail`

use std::path::PathBuf;

use crate::error::TrailError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "AUDIT_TRAIL_DATA_DIR";

/// Manages all paths used by audit-trail
#[derive(Debug, Clone)]
pub struct AuditPaths {
    /// Base directory for all audit-trail data
    base_dir: PathBuf,
}

impl AuditPaths {
    /// Create a new AuditPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, TrailError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create AuditPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/audit-trail/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding entity tables
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the directory holding the audit event log
    pub fn audit_dir(&self) -> PathBuf {
        self.base_dir.join("audit")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the append-only event log
    pub fn events_file(&self) -> PathBuf {
        self.audit_dir().join("events.jsonl")
    }

    /// Get the path to an entity table, e.g. `data/employee.json`
    pub fn table_file(&self, entity_type: &str) -> PathBuf {
        self.data_dir()
            .join(format!("{}.json", entity_type.to_lowercase()))
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), TrailError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| TrailError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| TrailError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.audit_dir())
            .map_err(|e| TrailError::Io(format!("Failed to create audit directory: {}", e)))?;

        Ok(())
    }

    /// Check if audit-trail has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, TrailError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| TrailError::Config("HOME environment variable not set".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("audit-trail"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, TrailError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| TrailError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("audit-trail"))
}
