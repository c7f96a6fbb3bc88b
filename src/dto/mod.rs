//! Data shaped for the presentation layer.

pub mod search;
