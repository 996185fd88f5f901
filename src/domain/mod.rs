//! Domain layer for the insight pipeline
//!
//! Pure models plus the port traits that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
