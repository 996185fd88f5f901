//! Infrastructure adapters for external systems.

pub mod cache;
pub mod llm;
pub mod reports;
pub mod sqlite;
