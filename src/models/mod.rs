//! Configuration models shared by the binary and the session driver.

pub mod config;
