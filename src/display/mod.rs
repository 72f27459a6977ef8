//! Display formatting for terminal output
//!
//! Renders entities, audit events and history as tables.

pub mod entities;
pub mod events;

pub use entities::{
    format_address_list, format_department_list, format_employee_details, format_employee_list,
    format_enrollment_list, format_training_list,
};
pub use events::{
    format_entity_state, format_event_details, format_event_table, format_field_history,
    format_history,
};
