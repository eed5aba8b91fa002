//! Core of eosync: keeps the occurrences of recurring local events in step
//! with CRM event records.
//!
//! - `sync` matches occurrences to records and applies the difference
//! - `location` keeps venues and CRM location blocks in step
//! - `store` persists which record belongs to which occurrence
//! - `remote` talks to the CRM through a provider binary

pub mod config;
pub mod correspondence;
pub mod error;
pub mod event;
pub mod ids;
pub mod local;
pub mod location;
pub mod prepare;
pub mod recurrence;
pub mod remote;
pub mod site;
pub mod store;
pub mod sync;

pub use error::{CoreError, CoreResult};
