//! Dedup Store implementations.
//!
//! Available backends:
//! - `MemoryStore` - In-memory set (always available)
//! - `SqliteStore` - SQLite file (requires `sqlite` feature)
//! - `MySqlStore` - MySQL / TiDB (requires `mysql` feature)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "mysql")]
pub use mysql::MySqlStore;
