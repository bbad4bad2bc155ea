//! # storage-adapters
//!
//! Repository implementations behind the `domains` ports: an in-memory
//! store (always compiled; the test backend and single-process default)
//! and a Postgres store behind the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
