use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use audit_trail::cli::{
    handle_address_command, handle_audit_command, handle_department_command,
    handle_employee_command, handle_enrollment_command, handle_training_command,
};
use audit_trail::config::{paths::AuditPaths, settings::Settings};
use audit_trail::services::open_auditor;

#[derive(Parser)]
#[command(
    name = "audit-trail",
    version,
    about = "HR records with a built-in audit trail",
    long_about = "audit-trail manages employees, departments, addresses and trainings \
                  and records every create, update and delete as an immutable audit \
                  event with a field-level diff and a readable summary."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Employee management commands
    #[command(subcommand, alias = "emp")]
    Employee(audit_trail::cli::EmployeeCommands),

    /// Department management commands
    #[command(subcommand, alias = "dept")]
    Department(audit_trail::cli::DepartmentCommands),

    /// Address management commands
    #[command(subcommand)]
    Address(audit_trail::cli::AddressCommands),

    /// Training management commands
    #[command(subcommand)]
    Training(audit_trail::cli::TrainingCommands),

    /// Training enrollment commands
    #[command(subcommand)]
    Enrollment(audit_trail::cli::EnrollmentCommands),

    /// Query and export the audit trail
    #[command(subcommand)]
    Audit(audit_trail::cli::AuditCommands),

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("audit-trail - HR records with a built-in audit trail");
            println!();
            println!("Run 'audit-trail --help' for usage information.");
            return Ok(());
        }
    };

    match command {
        Commands::Init => {
            println!("Initializing audit-trail at: {}", paths.base_dir().display());
            audit_trail::storage::init::initialize_storage(&paths)?;
            println!("Initialization complete!");
            println!("Events are recorded in {}", paths.events_file().display());
        }
        Commands::Config => {
            println!("audit-trail Configuration");
            println!("=========================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Event log:       {}", paths.events_file().display());
            println!();
            println!("Settings:");
            println!("  Domain:            {}", settings.domain);
            println!("  Default initiator: {}", settings.default_initiator);
            println!("  Metadata fields:   {}", settings.metadata_fields.join(", "));
            println!("  Append attempts:   {}", settings.retry.max_attempts);
            println!("  Log filter:        {}", settings.log_filter);
        }
        Commands::Employee(cmd) => handle_employee_command(&open_auditor(&paths, &settings)?, cmd)?,
        Commands::Department(cmd) => {
            handle_department_command(&open_auditor(&paths, &settings)?, cmd)?
        }
        Commands::Address(cmd) => handle_address_command(&open_auditor(&paths, &settings)?, cmd)?,
        Commands::Training(cmd) => handle_training_command(&open_auditor(&paths, &settings)?, cmd)?,
        Commands::Enrollment(cmd) => {
            handle_enrollment_command(&open_auditor(&paths, &settings)?, cmd)?
        }
        Commands::Audit(cmd) => handle_audit_command(&open_auditor(&paths, &settings)?, cmd)?,
    }

    Ok(())
}
