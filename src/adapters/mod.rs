//! External store integrations for GeoMigrate.
//!
//! - [`database`] - Store abstraction layer (trait-based)
//! - [`sqlite`] - Read-only SQLite origin
//! - [`postgresql`] - Transactional PostgreSQL destination
//!
//! # Design Pattern
//!
//! Adapters isolate the database drivers behind the traits in [`database`].
//! The migration pipeline never sees a driver type, which keeps it testable
//! with in-memory doubles.
//!
//! ```rust,no_run
//! use geomigrate::adapters::postgresql::{PostgresClient, PostgresDestination};
//! use geomigrate::adapters::sqlite::SqliteSource;
//! use geomigrate::config::load_config;
//! use geomigrate::domain::City;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("geomigrate.toml")?;
//! let workers = config.migration.worker_count();
//!
//! let source = SqliteSource::<City>::open(&config.source.path)?;
//! let client = PostgresClient::new(&config.destination, workers)?;
//! client.test_connection().await?;
//! let destination = PostgresDestination::new(client, config.migration.orphan_cities);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod postgresql;
pub mod sqlite;
