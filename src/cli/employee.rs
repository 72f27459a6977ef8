//! Employee CLI commands

use clap::Subcommand;

use crate::audit::Auditor;
use crate::display::{format_employee_details, format_employee_list};
use crate::error::{TrailError, TrailResult};
use crate::models::Employee;
use crate::services::{EmployeeService, EmployeeUpdate};

/// Employee subcommands
#[derive(Subcommand)]
pub enum EmployeeCommands {
    /// List employees
    List {
        /// Only employees in this department
        #[arg(short, long)]
        department: Option<i64>,
    },

    /// Add a new employee
    Add {
        first_name: String,
        last_name: String,
        email: String,
        #[arg(long)]
        phone: Option<String>,
        /// Department ID
        #[arg(short, long)]
        department: Option<i64>,
        /// Address ID
        #[arg(short, long)]
        address: Option<i64>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Show employee details
    Show { id: i64 },

    /// Update an employee
    Update {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// New phone number (empty to clear)
        #[arg(long)]
        phone: Option<String>,
        /// New department ID (0 to clear)
        #[arg(short, long)]
        department: Option<i64>,
        /// New address ID (0 to clear)
        #[arg(short, long)]
        address: Option<i64>,
        /// Fail unless the stored version matches
        #[arg(long)]
        expect_version: Option<i32>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Delete an employee
    Delete {
        id: i64,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },
}

/// Handle an employee command
pub fn handle_employee_command(auditor: &Auditor, cmd: EmployeeCommands) -> TrailResult<()> {
    let service = EmployeeService::new(auditor);

    match cmd {
        EmployeeCommands::List { department } => {
            let employees = match department {
                Some(id) => service.list_by_department(id)?,
                None => service.list()?,
            };
            println!("{}", format_employee_list(&employees));
        }

        EmployeeCommands::Add {
            first_name,
            last_name,
            email,
            phone,
            department,
            address,
            by,
        } => {
            let mut employee = Employee::new(first_name, last_name, email);
            employee.phone = phone;
            employee.department_id = department;
            employee.address_id = address;

            let created = service.create(employee, by.as_deref())?;
            println!("Created employee: {}", created);
            println!("  ID: {}", created.id.unwrap_or_default());
        }

        EmployeeCommands::Show { id } => {
            let employee = service
                .get(id)?
                .ok_or_else(|| TrailError::not_found("Employee", id))?;
            println!("{}", format_employee_details(&employee));
        }

        EmployeeCommands::Update {
            id,
            first_name,
            last_name,
            email,
            phone,
            department,
            address,
            expect_version,
            by,
        } => {
            let changes = EmployeeUpdate {
                first_name,
                last_name,
                email,
                phone,
                department_id: department,
                address_id: address,
                expected_version: expect_version,
            };
            let updated = service.update(id, changes, by.as_deref())?;
            println!("Updated employee: {} (version {})", updated, updated.version);
        }

        EmployeeCommands::Delete { id, by } => {
            service.delete(id, by.as_deref())?;
            println!("Deleted employee {}", id);
        }
    }

    Ok(())
}
