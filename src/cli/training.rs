//! Training CLI commands

use clap::Subcommand;

use crate::audit::Auditor;
use crate::display::format_training_list;
use crate::error::TrailResult;
use crate::services::{TrainingService, TrainingUpdate};

/// Training subcommands
#[derive(Subcommand)]
pub enum TrainingCommands {
    /// List trainings
    List,

    /// Add a training
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Update a training
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// New description (empty to clear)
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        expect_version: Option<i32>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Delete a training with no enrollments
    Delete {
        id: i64,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },
}

/// Handle a training command
pub fn handle_training_command(auditor: &Auditor, cmd: TrainingCommands) -> TrailResult<()> {
    let service = TrainingService::new(auditor);

    match cmd {
        TrainingCommands::List => {
            println!("{}", format_training_list(&service.list()?));
        }
        TrainingCommands::Add {
            name,
            description,
            by,
        } => {
            let training = service.create(&name, description.as_deref(), by.as_deref())?;
            println!(
                "Created training: {} (ID {})",
                training.name,
                training.id.unwrap_or_default()
            );
        }
        TrainingCommands::Update {
            id,
            name,
            description,
            expect_version,
            by,
        } => {
            let changes = TrainingUpdate {
                name,
                description,
                expected_version: expect_version,
            };
            let training = service.update(id, changes, by.as_deref())?;
            println!("Updated training {}: {}", id, training.name);
        }
        TrainingCommands::Delete { id, by } => {
            service.delete(id, by.as_deref())?;
            println!("Deleted training {}", id);
        }
    }

    Ok(())
}
