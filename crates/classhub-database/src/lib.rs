//! # classhub-database
//!
//! PostgreSQL database connection management and concrete repository
//! implementations for all ClassHub entities, including the row-lock
//! acquisition used by the reservation critical section.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
