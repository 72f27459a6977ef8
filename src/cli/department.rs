//! Department CLI commands

use clap::Subcommand;

use crate::audit::Auditor;
use crate::display::format_department_list;
use crate::error::TrailResult;
use crate::services::DepartmentService;

/// Department subcommands
#[derive(Subcommand)]
pub enum DepartmentCommands {
    /// List departments
    List,

    /// Add a department
    Add {
        name: String,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Rename a department
    Rename {
        id: i64,
        name: String,
        #[arg(long)]
        expect_version: Option<i32>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Delete a department with no employees
    Delete {
        id: i64,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },
}

/// Handle a department command
pub fn handle_department_command(auditor: &Auditor, cmd: DepartmentCommands) -> TrailResult<()> {
    let service = DepartmentService::new(auditor);

    match cmd {
        DepartmentCommands::List => {
            println!("{}", format_department_list(&service.list()?));
        }
        DepartmentCommands::Add { name, by } => {
            let department = service.create(&name, by.as_deref())?;
            println!(
                "Created department: {} (ID {})",
                department.name,
                department.id.unwrap_or_default()
            );
        }
        DepartmentCommands::Rename {
            id,
            name,
            expect_version,
            by,
        } => {
            let department = service.rename(id, &name, expect_version, by.as_deref())?;
            println!("Renamed department {} to '{}'", id, department.name);
        }
        DepartmentCommands::Delete { id, by } => {
            service.delete(id, by.as_deref())?;
            println!("Deleted department {}", id);
        }
    }

    Ok(())
}
