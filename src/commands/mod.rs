//! Subcommand handlers. Each takes the resolved `Config`, builds the API
//! client and token session it needs, and prints results through the output
//! module.

pub mod auth;
pub mod machines;
pub mod reservations;
pub mod users;
