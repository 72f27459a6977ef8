//! Address CLI commands

use clap::Subcommand;

use crate::audit::Auditor;
use crate::display::format_address_list;
use crate::error::TrailResult;
use crate::models::Address;
use crate::services::{AddressService, AddressUpdate};

/// Address subcommands
#[derive(Subcommand)]
pub enum AddressCommands {
    /// List addresses
    List,

    /// Add an address
    Add {
        line1: String,
        country: String,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        line3: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Update an address (empty values clear optional lines)
    Update {
        id: i64,
        #[arg(long)]
        line1: Option<String>,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        line3: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
        #[arg(long)]
        expect_version: Option<i32>,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },

    /// Delete an address nobody lives at
    Delete {
        id: i64,
        #[arg(long, env = "AUDIT_TRAIL_USER")]
        by: Option<String>,
    },
}

/// Handle an address command
pub fn handle_address_command(auditor: &Auditor, cmd: AddressCommands) -> TrailResult<()> {
    let service = AddressService::new(auditor);

    match cmd {
        AddressCommands::List => {
            println!("{}", format_address_list(&service.list()?));
        }
        AddressCommands::Add {
            line1,
            country,
            line2,
            line3,
            postal_code,
            by,
        } => {
            let mut address = Address::new(line1, country);
            address.address_line_2 = line2;
            address.address_line_3 = line3;
            address.postal_code = postal_code;

            let created = service.create(address, by.as_deref())?;
            println!(
                "Created address {}: {}",
                created.id.unwrap_or_default(),
                created
            );
        }
        AddressCommands::Update {
            id,
            line1,
            line2,
            line3,
            country,
            postal_code,
            expect_version,
            by,
        } => {
            let changes = AddressUpdate {
                address_line_1: line1,
                address_line_2: line2,
                address_line_3: line3,
                country,
                postal_code,
                expected_version: expect_version,
            };
            let updated = service.update(id, changes, by.as_deref())?;
            println!("Updated address {}: {}", id, updated);
        }
        AddressCommands::Delete { id, by } => {
            service.delete(id, by.as_deref())?;
            println!("Deleted address {}", id);
        }
    }

    Ok(())
}
