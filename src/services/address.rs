//! Address service

use crate::audit::{Auditor, Operation};
use crate::error::{TrailError, TrailResult};
use crate::models::{Address, Employee, Entity};
use crate::storage::Transaction;

use super::{check_version, optional, required};

pub const CREATE_ADDRESS: Operation = Operation::create(Address::ENTITY_TYPE);
pub const UPDATE_ADDRESS: Operation = Operation::update(Address::ENTITY_TYPE);
pub const DELETE_ADDRESS: Operation = Operation::delete(Address::ENTITY_TYPE);

/// Current-state loader for addresses
pub fn load(tx: &Transaction<'_>, id: i64) -> TrailResult<Option<Address>> {
    tx.get(id)
}

/// Requested changes to an address; empty strings clear optional lines
#[derive(Debug, Clone, Default)]
pub struct AddressUpdate {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub address_line_3: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub expected_version: Option<i32>,
}

/// Service for address management
pub struct AddressService<'a> {
    auditor: &'a Auditor,
}

impl<'a> AddressService<'a> {
    pub fn new(auditor: &'a Auditor) -> Self {
        Self { auditor }
    }

    /// Create a new address
    pub fn create(&self, address: Address, initiator: Option<&str>) -> TrailResult<Address> {
        self.auditor.create(&CREATE_ADDRESS, initiator, |tx| {
            let mut address = address;
            address.address_line_1 = required(&address.address_line_1, "Address line 1")?;
            address.country = required(&address.country, "Country")?;
            address.address_line_2 = address.address_line_2.as_deref().and_then(optional);
            address.address_line_3 = address.address_line_3.as_deref().and_then(optional);
            address.postal_code = address.postal_code.as_deref().and_then(optional);
            if let Some(who) = initiator {
                address.updated_by = Some(who.to_string());
            }

            address.validate().map_err(TrailError::Validation)?;
            tx.insert(address)
        })
    }

    /// Apply changes to an existing address
    pub fn update(
        &self,
        id: i64,
        changes: AddressUpdate,
        initiator: Option<&str>,
    ) -> TrailResult<Address> {
        self.auditor.update(&UPDATE_ADDRESS, id, initiator, |tx| {
            let mut address: Address = tx.require(id)?;
            check_version(&address, changes.expected_version)?;

            if let Some(line) = changes.address_line_1 {
                address.address_line_1 = required(&line, "Address line 1")?;
            }
            if let Some(line) = changes.address_line_2 {
                address.address_line_2 = optional(&line);
            }
            if let Some(line) = changes.address_line_3 {
                address.address_line_3 = optional(&line);
            }
            if let Some(country) = changes.country {
                address.country = required(&country, "Country")?;
            }
            if let Some(postal_code) = changes.postal_code {
                address.postal_code = optional(&postal_code);
            }
            if let Some(who) = initiator {
                address.updated_by = Some(who.to_string());
            }

            address.validate().map_err(TrailError::Validation)?;
            tx.update(address)
        })
    }

    /// Delete an address no employee lives at
    pub fn delete(&self, id: i64, initiator: Option<&str>) -> TrailResult<()> {
        self.auditor
            .delete::<Address, _, _>(&DELETE_ADDRESS, id, initiator, |tx| {
                let residents = tx.filter(|e: &Employee| e.address_id == Some(id))?;
                if !residents.is_empty() {
                    return Err(TrailError::Validation(format!(
                        "Address {} is still used by {} employee(s)",
                        id,
                        residents.len()
                    )));
                }

                tx.delete::<Address>(id)?;
                Ok(())
            })
    }

    pub fn get(&self, id: i64) -> TrailResult<Option<Address>> {
        self.auditor.storage().addresses.get(id)
    }

    pub fn list(&self) -> TrailResult<Vec<Address>> {
        self.auditor.storage().addresses.get_all()
    }
}
