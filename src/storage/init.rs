//! Storage initialization
//!
//! Handles first-run setup: directories, default settings and empty tables.

use tracing::info;

use crate::config::paths::AuditPaths;
use crate::config::settings::Settings;
use crate::error::TrailError;

use super::Storage;

/// Initialize storage for a fresh installation
///
/// Existing settings and tables are left untouched, so running this twice
/// is harmless.
pub fn initialize_storage(paths: &AuditPaths) -> Result<Settings, TrailError> {
    paths.ensure_directories()?;

    let settings = Settings::load_or_create(paths)?;
    if !paths.settings_file().exists() {
        settings.save(paths)?;
    }

    let storage = Storage::open(paths.clone())?;
    let mut created = 0;
    for (entity_type, exists) in [
        ("EMPLOYEE", storage.employees.path().exists()),
        ("DEPARTMENT", storage.departments.path().exists()),
        ("ADDRESS", storage.addresses.path().exists()),
        ("TRAINING", storage.trainings.path().exists()),
        ("EMPLOYEE_TRAINING", storage.enrollments.path().exists()),
    ] {
        if !exists {
            storage.save_table(entity_type)?;
            created += 1;
        }
    }

    info!(base_dir = %paths.base_dir().display(), tables_created = created, "Storage initialized");
    Ok(settings)
}
