//! Domain types for search reconciliation.

pub mod filter;
pub mod listing;
pub mod record;
pub mod request;
pub mod types;
