//! SQLite adapters for the business data store.

pub mod connection;
pub mod data_store;

pub use connection::{
    connect, create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig,
};
pub use data_store::{quote_ident, returns_rows, SqliteDataStore};
