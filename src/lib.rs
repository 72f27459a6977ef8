//! audit-trail - HR records with a non-invasive audit trail
//!
//! Every create, update and delete of an audited entity is captured as an
//! immutable [`AuditEvent`](audit::AuditEvent): who did it, when, a
//! field-level diff for updates and a human-readable summary. Business
//! services declare their operations and otherwise stay unaware of auditing.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Audited HR entities and the `Entity` trait
//! - `storage`: JSON table storage and transactional units of work
//! - `audit`: Interception, snapshots, diffing, summaries, event store and history
//! - `services`: Business logic layer
//! - `export`: CSV, JSON and YAML export of events
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_trail::config::{paths::AuditPaths, settings::Settings};
//! use audit_trail::services::{open_auditor, EmployeeService};
//!
//! let paths = AuditPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let auditor = open_auditor(&paths, &settings)?;
//! let employees = EmployeeService::new(&auditor);
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{TrailError, TrailResult};
