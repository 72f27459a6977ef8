//! Configuration module for audit-trail
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Persisted audit settings

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::{RetrySettings, Settings};
