//! Shared dashboard state and the persisted alias table.

pub mod dashboard_state;
pub mod mapping_store;
