//! Training enrollment CLI commands

use clap::Subcommand;

use super::{parse_date, parse_status};
use crate::audit::Auditor;
use crate::display::format_enrollment_list;
use crate::error::TrailResult;
use crate::services::{EnrollmentService, EnrollmentUpdate};

/// Enrollment subcommands
#[derive(Subcommand)]
pub enum EnrollmentCommands {
    /// List enrollments
    List {
        /// Only enrollments of this employee
        #[arg(short, long)]
        employee: Option<i64>,
    },

    /// Enroll an employee in a training
    Assign {
        employee: i64,
        training: i64,
        /// Allocation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Change the status of an enrollment
    Status {
        id: i64,
        /// allocated, in-progress, completed or cancelled
        status: String,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Update an enrollment
    Update {
        id: i64,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        expect_version: Option<i32>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Remove an enrollment
    Delete {
        id: i64,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },
}

/// Handle an enrollment command
pub fn handle_enrollment_command(auditor: &Auditor, cmd: EnrollmentCommands) -> TrailResult<()> {
    let service = EnrollmentService::new(auditor);

    match cmd {
        EnrollmentCommands::List { employee } => {
            let enrollments = match employee {
                Some(id) => service.list_for_employee(id)?,
                None => service.list()?,
            };
            println!("{}", format_enrollment_list(&enrollments));
        }

        EnrollmentCommands::Assign {
            employee,
            training,
            date,
            by,
        } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let enrollment = service.assign(employee, training, date, by.as_deref())?;
            println!(
                "Enrolled employee {} in training {} (enrollment {})",
                employee,
                training,
                enrollment.id.unwrap_or_default()
            );
        }

        EnrollmentCommands::Status { id, status, by } => {
            let enrollment = service.set_status(id, parse_status(&status)?, by.as_deref())?;
            println!("Enrollment {} is now {}", id, enrollment.status);
        }

        EnrollmentCommands::Update {
            id,
            status,
            date,
            expect_version,
            by,
        } => {
            let changes = EnrollmentUpdate {
                status: status.as_deref().map(parse_status).transpose()?,
                date_of_allocation: date.as_deref().map(parse_date).transpose()?,
                expected_version: expect_version,
            };
            let enrollment = service.update(id, changes, by.as_deref())?;
            println!("Updated enrollment {} (version {})", id, enrollment.version);
        }

        EnrollmentCommands::Delete { id, by } => {
            service.delete(id, by.as_deref())?;
            println!("Deleted enrollment {}", id);
        }
    }

    Ok(())
}
