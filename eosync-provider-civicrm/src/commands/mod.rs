pub mod addresses;
pub mod check_ready;
pub mod emails;
pub mod event_types;
pub mod events;
pub mod locations;
pub mod phones;
pub mod registration;
