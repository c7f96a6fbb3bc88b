//! Search query reconciliation for the stays frontend.
//!
//! Keeps a search view's URL, its draft form, a remembered "last search" and
//! a shared cache of result pages consistent with each other.

pub mod cache;
pub mod domain;
pub mod dto;
pub mod error_conversions;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod query;
pub mod repository;
pub mod services;
pub mod store;

#[cfg(feature = "client")]
pub mod api;
#[cfg(feature = "client")]
pub mod runtime;
