//! PostgreSQL destination store
//!
//! Writes countries and cities through pooled connections, one transaction
//! per worker.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgresDestination;
pub use client::PostgresClient;
pub use models::PostgresRecord;
